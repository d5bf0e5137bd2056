#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    todolist::cli::main()
}
