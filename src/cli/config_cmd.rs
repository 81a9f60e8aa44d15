use std::error::Error;

use super::ConfigCommands;
use crate::core::config::data::path_display;
use crate::core::config::Config;

pub fn run(mut config: Config, command: ConfigCommands) -> Result<(), Box<dyn Error>> {
    match command {
        ConfigCommands::Show => config.print_all(),
        ConfigCommands::Path => println!("{}", path_display(Config::get_config_path()?)),
        ConfigCommands::Set { key, value } => {
            let value = value.join(" ");
            config.set(&key, &value)?;
            let path = config.save()?;
            println!("✅ Set {key} in {}", path_display(path));
        }
        ConfigCommands::Unset { key } => {
            config.unset(&key)?;
            let path = config.save()?;
            println!("✅ Unset {key} in {}", path_display(path));
        }
    }
    Ok(())
}
