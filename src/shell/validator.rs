//! Syntax validation over an already-built parse tree (spec §4.6), grounded
//! on `parser.c`'s `checkShellCmd`/`checkCmdGroup`/`checkAtomic`/
//! `checkTerminals`.

use super::error::Error;
use super::tokenizer::{PipeSep, Separator, ShellCommand};

/// Checks the shape of `cmd` against every rule in spec §4.6. Illegal
/// separator characters inside argument tokens can't actually occur (they
/// are split points by construction) but are re-checked anyway so
/// validation stays a pure function of the token tree shape, independent of
/// how it was built.
pub fn validate(cmd: &ShellCommand) -> Result<(), Error> {
    if cmd.groups.is_empty() {
        return Err(Error::UserSyntax);
    }
    for (i, sep) in cmd.separators.iter().enumerate() {
        let is_last = i == cmd.separators.len() - 1;
        if is_last && !matches!(sep, Separator::None | Separator::Amp) {
            return Err(Error::UserSyntax);
        }
    }
    for group in &cmd.groups {
        validate_group(group)?;
    }
    Ok(())
}

fn validate_group(group: &super::tokenizer::CommandGroup) -> Result<(), Error> {
    if group.atomics.is_empty() {
        return Err(Error::UserSyntax);
    }
    if let Some(PipeSep::Pipe) = group.separators.last() {
        return Err(Error::UserSyntax);
    }
    for atomic in &group.atomics {
        validate_atomic(atomic)?;
    }
    Ok(())
}

fn validate_atomic(atomic: &super::tokenizer::Atomic) -> Result<(), Error> {
    if atomic.terminals.is_empty() {
        return Err(Error::UserSyntax);
    }
    for terminal in &atomic.terminals {
        if terminal.args.is_empty() {
            return Err(Error::UserSyntax);
        }
        for arg in &terminal.args {
            if arg.chars().any(|c| "|;&<>".contains(c)) {
                return Err(Error::UserSyntax);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::tokenizer::tokenize;

    #[test]
    fn accepts_well_formed_pipeline() {
        assert!(validate(&tokenize("ls -l | grep foo")).is_ok());
    }

    #[test]
    fn rejects_trailing_pipe() {
        assert!(matches!(validate(&tokenize("ls |")), Err(Error::UserSyntax)));
    }

    #[test]
    fn rejects_empty_command_group() {
        assert!(matches!(validate(&tokenize("ls ;; echo hi")), Err(Error::UserSyntax)));
    }

    #[test]
    fn rejects_separator_not_ending_in_none_or_amp() {
        assert!(matches!(validate(&tokenize("echo hi;")), Err(Error::UserSyntax)));
    }

    #[test]
    fn rejects_redirection_with_no_filename() {
        assert!(matches!(validate(&tokenize("sort >")), Err(Error::UserSyntax)));
    }

    #[test]
    fn accepts_trailing_ampersand() {
        assert!(validate(&tokenize("sleep 1 &")).is_ok());
    }
}
