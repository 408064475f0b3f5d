pub mod generate_random_delay;
pub mod logging;
