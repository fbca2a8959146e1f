use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches};

use super::Command;
use crate::error::ShellError;
use crate::shell::{Completion, Initializer, Shell, ShellBuilder};
use crate::value::Value;

/// Names of the commands every shell starts with.
pub const BUILTINS: &[&str] = &["inspect"];

/// Get a builtin command by name
///
/// Returns Some(command) if the name corresponds to a builtin, None otherwise.
pub fn get_builtin(name: &str) -> Option<Arc<dyn Command>> {
    match name {
        "inspect" => Some(Arc::new(Inspect)),
        _ => None,
    }
}

/// Registers the builtin command set on a shell under construction.
pub struct BuiltinCommands;

impl Initializer for BuiltinCommands {
    fn initialize(&self, builder: &mut ShellBuilder) -> Result<(), ShellError> {
        for name in BUILTINS {
            if let Some(command) = get_builtin(name) {
                builder.register_shared_command(*name, command);
            }
        }
        Ok(())
    }
}

/// `%inspect NAME...`: print the named bindings of the session scope.
pub struct Inspect;

impl Command for Inspect {
    fn options(&self, parser: clap::Command) -> clap::Command {
        parser.about("Allows inspecting variables").arg(
            Arg::new("names")
                .index(1)
                .num_args(1..)
                .required(true)
                .action(ArgAction::Append)
                .value_name("NAME")
                .help("the variables to inspect"),
        )
    }

    fn run(
        &self,
        shell: &mut Shell,
        args: &ArgMatches,
        _data: &str,
        _evaluation_id: &str,
    ) -> anyhow::Result<Completion> {
        let output = shell.output().clone();
        for name in args.get_many::<String>("names").into_iter().flatten() {
            output.write_line(&format!("{name}:"))?;
            match shell.binding(name) {
                Some(value) => output.write_line(&value.to_string())?,
                None => output.write_line("<undefined>")?,
            }
            output.write_line("")?;
        }
        Ok(Value::None.into())
    }
}
