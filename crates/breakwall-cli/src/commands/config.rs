use breakwall_core::Config;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dotted key
    Get {
        /// e.g. "timer.work_minutes", "enforcement.punishment_secs"
        key: String,
    },
    /// Change one value and save
    Set {
        key: String,
        value: String,
    },
    /// Print the whole config
    List {
        /// Print TOML as stored on disk instead of JSON
        #[arg(long)]
        toml: bool,
    },
    /// Print the config file location
    Path,
    /// Overwrite the config with defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or_else(|| format!("unknown config key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List { toml } => {
            let config = Config::load()?;
            if toml {
                print!("{}", config.to_toml()?);
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
