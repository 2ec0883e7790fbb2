use rdx_shell::shell::{tokenize, validate};

fn is_valid(line: &str) -> bool {
    validate(&tokenize(line)).is_ok()
}

#[test]
fn accepts_a_realistic_pipeline_with_redirection_and_background() {
    assert!(is_valid("cat < in.txt | grep foo | sort >> out.txt ; sleep 1 &"));
}

#[test]
fn rejects_every_documented_invalid_shape() {
    assert!(!is_valid("ls |"));
    assert!(!is_valid("ls ;; echo hi"));
    assert!(!is_valid("echo hi;"));
    assert!(!is_valid("sort >"));
    assert!(!is_valid(""));
}
