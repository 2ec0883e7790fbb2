use rdx_shell::shell::tokenize;
use rdx_shell::shell::tokenizer::{PipeSep, RedirSep, Separator};

#[test]
fn a_realistic_line_parses_into_the_full_three_level_tree() {
    let cmd = tokenize("cat < in.txt | grep foo | sort >> out.txt ; sleep 1 &");

    assert_eq!(cmd.groups.len(), 2);
    assert_eq!(cmd.separators, vec![Separator::Semi, Separator::Amp]);

    let pipeline = &cmd.groups[0];
    assert_eq!(pipeline.atomics.len(), 3);
    assert_eq!(pipeline.separators, vec![PipeSep::Pipe, PipeSep::Pipe, PipeSep::None]);

    let cat = &pipeline.atomics[0];
    assert_eq!(cat.terminals[0].args, vec!["cat"]);
    assert_eq!(cat.terminals[1].args, vec!["in.txt"]);
    assert_eq!(cat.separators, vec![RedirSep::In, RedirSep::None]);

    let sort = &pipeline.atomics[2];
    assert_eq!(sort.terminals[0].args, vec!["sort"]);
    assert_eq!(sort.terminals[1].args, vec!["out.txt"]);
    assert_eq!(sort.separators, vec![RedirSep::Append, RedirSep::None]);

    let background = &cmd.groups[1];
    assert_eq!(background.atomics[0].terminals[0].args, vec!["sleep", "1"]);
}
