use placard;

fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // Run the template editor application
    placard::run_app()
}
