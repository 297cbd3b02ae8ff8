use super::args::*;

pub mod budget_check;
pub mod diff;
pub mod evaluate;
pub mod fix;
pub(crate) mod input;
pub mod locate;
pub(crate) mod output;
pub mod validate;
pub mod watch;

use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Evaluate(args) => evaluate::run(&args),
        Command::BudgetCheck(args) => budget_check::run(&args),
        Command::Diff(args) => diff::run(&args),
        Command::Validate(args) => validate::run(&args),
        Command::Locate(args) => locate::run(&args),
        Command::Fix(args) => fix::run(&args),
        Command::Watch(args) => watch::run(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
