fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // Run the floorplan editor
    floorplan_tool::run_app()
}
