fn main() -> Result<(), eframe::Error> {
    // Set up logging; RUST_LOG=debug shows drag and layout events
    env_logger::init();

    schema_builder::run_app()
}
