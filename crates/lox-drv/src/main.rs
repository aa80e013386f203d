use std::process::ExitCode;

fn main() -> ExitCode {
    lox_drv::main()
}
