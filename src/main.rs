fn main() {
    let code = install_canary::run_cli();
    if code != 0 {
        std::process::exit(code);
    }
}
