use std::fmt;
use std::sync::{Arc, LazyLock};

use clap::{ArgMatches, ColorChoice};
use regex::Regex;
use tracing::warn;

use super::{Command, CommandRegistry};
use crate::error::ShellError;
use crate::output::Output;

// %name or %%name; the argument string starts at the first character the name can't hold
static INVOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(%%?)([A-Za-z0-9._]+)\s*(.*)$").expect("invocation pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandForm {
    /// `%name`: a line magic.
    Line,
    /// `%%name`: a cell magic whose data block follows the first line.
    Block,
}

/// The pieces of a command invocation, before resolution against a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    pub form: CommandForm,
    pub name: &'a str,
    pub args: &'a str,
    pub data: &'a str,
}

/// A resolved command plus its validated arguments, built for exactly one evaluation.
pub struct ParsedCommand {
    pub name: String,
    pub form: CommandForm,
    pub command: Arc<dyn Command>,
    pub args: ArgMatches,
    pub data: String,
}

impl fmt::Debug for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedCommand")
            .field("name", &self.name)
            .field("form", &self.form)
            .field("args", &self.args)
            .field("data", &self.data)
            .finish()
    }
}

/// Split `text` into its invocation line and data block, and match the invocation line.
///
/// Only the first newline separates the two; the data block is returned verbatim.
pub fn split_invocation(text: &str) -> Result<Invocation<'_>, ShellError> {
    let (line, data) = text.split_once('\n').unwrap_or((text, ""));

    let captures = INVOCATION
        .captures(line)
        .ok_or(ShellError::InvalidCommandSyntax)?;
    let form = if &captures[1] == "%%" {
        CommandForm::Block
    } else {
        CommandForm::Line
    };
    let name = captures.get(2).map_or("", |m| m.as_str());
    let args = captures.get(3).map_or("", |m| m.as_str());

    Ok(Invocation {
        form,
        name,
        args,
        data,
    })
}

/// Whitespace tokenization; quotes have no special meaning.
pub fn tokenize(args: &str) -> Vec<&str> {
    args.split_whitespace().collect()
}

/// Parse `text` into a command ready to run.
///
/// Returns `Ok(None)` when argument parsing stopped without producing arguments: help
/// output goes to `output`, validation diagnostics go to `diagnostics`. Neither case is
/// an error for the caller.
pub fn parse_command(
    registry: &CommandRegistry,
    text: &str,
    output: &Output,
    diagnostics: &Output,
) -> Result<Option<ParsedCommand>, ShellError> {
    let invocation = split_invocation(text)?;

    let command = registry
        .get(invocation.name)
        .ok_or_else(|| ShellError::UnknownCommand(invocation.name.to_string()))?;

    let parser = command.options(argument_parser(invocation.name));
    let args = match parser.try_get_matches_from(tokenize(invocation.args)) {
        Ok(args) => args,
        Err(err) => {
            let rendered = err.render().to_string();
            if err.use_stderr() {
                warn!(command = invocation.name, kind = ?err.kind(), "rejected command arguments");
                diagnostics.write_str(&rendered)?;
            } else {
                output.write_str(&rendered)?;
            }
            return Ok(None);
        }
    };

    Ok(Some(ParsedCommand {
        name: invocation.name.to_string(),
        form: invocation.form,
        command,
        args,
        data: invocation.data.to_string(),
    }))
}

fn argument_parser(name: &str) -> clap::Command {
    clap::Command::new(name.to_string())
        .no_binary_name(true)
        .color(ColorChoice::Never)
        .disable_version_flag(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{Completion, Shell};
    use crate::value::Value;
    use clap::{Arg, ArgAction};

    struct Names;

    impl Command for Names {
        fn options(&self, parser: clap::Command) -> clap::Command {
            parser.about("collects names").arg(
                Arg::new("names")
                    .index(1)
                    .num_args(1..)
                    .required(true)
                    .action(ArgAction::Append),
            )
        }

        fn run(
            &self,
            _shell: &mut Shell,
            _args: &ArgMatches,
            _data: &str,
            _evaluation_id: &str,
        ) -> anyhow::Result<Completion> {
            Ok(Value::None.into())
        }
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register("names", Arc::new(Names));
        registry
    }

    #[test]
    fn line_form_has_no_data() {
        let invocation = split_invocation("%inspect a b").unwrap();
        assert_eq!(invocation.form, CommandForm::Line);
        assert_eq!(invocation.name, "inspect");
        assert_eq!(invocation.args, "a b");
        assert_eq!(invocation.data, "");
    }

    #[test]
    fn block_form_keeps_data_verbatim() {
        let invocation = split_invocation("%%json --strict\n{\"a\": 1}\n\n  tail  ").unwrap();
        assert_eq!(invocation.form, CommandForm::Block);
        assert_eq!(invocation.name, "json");
        assert_eq!(invocation.args, "--strict");
        assert_eq!(invocation.data, "{\"a\": 1}\n\n  tail  ");
    }

    #[test]
    fn names_allow_dots_and_underscores() {
        let invocation = split_invocation("%my.cmd_2").unwrap();
        assert_eq!(invocation.name, "my.cmd_2");
        assert_eq!(invocation.args, "");
    }

    #[test]
    fn malformed_invocations_are_rejected() {
        for text in ["%", "%%", "% name", "%%%name", "%-x"] {
            assert!(
                matches!(split_invocation(text), Err(ShellError::InvalidCommandSyntax)),
                "{text} should not parse"
            );
        }
    }

    #[test]
    fn arguments_may_follow_the_name_without_whitespace() {
        let invocation = split_invocation("%inspect-x").unwrap();
        assert_eq!(invocation.name, "inspect");
        assert_eq!(invocation.args, "-x");

        let invocation = split_invocation("%name!").unwrap();
        assert_eq!(invocation.name, "name");
        assert_eq!(invocation.args, "!");
    }

    #[test]
    fn tokenizing_ignores_quotes_and_repeated_spaces() {
        assert_eq!(tokenize("  a   \"b c\"\td "), vec!["a", "\"b", "c\"", "d"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn unknown_commands_are_reported_by_name() {
        let (output, _) = Output::capture();
        let err = parse_command(&registry(), "%missing x", &output, &output).unwrap_err();
        assert!(matches!(err, ShellError::UnknownCommand(ref name) if name == "missing"));
    }

    #[test]
    fn arguments_are_parsed_against_the_schema() {
        let (output, _) = Output::capture();
        let parsed = parse_command(&registry(), "%names x y", &output, &output)
            .unwrap()
            .unwrap();
        let names: Vec<&String> = parsed.args.get_many::<String>("names").unwrap().collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(parsed.form, CommandForm::Line);
    }

    #[test]
    fn validation_failures_produce_a_diagnostic_and_no_command() {
        let (output, printed) = Output::capture();
        let (diagnostics, reported) = Output::capture();
        let parsed = parse_command(&registry(), "%names", &output, &diagnostics).unwrap();
        assert!(parsed.is_none());
        assert!(printed.contents().is_empty());
        assert!(reported.contents().contains("required"));
    }

    #[test]
    fn help_goes_to_regular_output() {
        let (output, printed) = Output::capture();
        let (diagnostics, reported) = Output::capture();
        let parsed = parse_command(&registry(), "%names --help", &output, &diagnostics).unwrap();
        assert!(parsed.is_none());
        assert!(printed.contents().contains("collects names"));
        assert!(reported.contents().is_empty());
    }
}
