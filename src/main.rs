fn main() {
    suitetree::cli::run();
}
