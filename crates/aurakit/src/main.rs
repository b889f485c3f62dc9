use aurakit::catalog;
use aurakit::config;
use aurakit::contact::{ContactForm, ContactMode, DEFAULT_RECIPIENT, LinkError, PhoneNumber};
use aurakit::control::{ControlCommand, SOCKET_PATH};
use aurakit::gate::{AccessOutcome, Gate, Pin};
use aurakit::rng::Prng;
use aurakit::store::{FileStore, FlagStore};
use aurakit::wheel::Wheel;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::os::unix::net::UnixStream;

#[derive(Parser, Debug)]
#[command(name = "aurakit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// PIN that unlocks the members area
    #[arg(long, global = true, env = "AURA_PIN")]
    pin: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Unlock the members area with a PIN
    Unlock { input: String },
    /// Forget a previous unlock
    Lock,
    /// Print whether the members area is unlocked
    Status,
    /// Spin the crystal wheel once and print the result
    Spin {
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print a pre-filled messaging link
    Link {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        message: String,
        #[arg(long, default_value_t = ContactMode::Consulta)]
        mode: ContactMode,
        #[arg(long, default_value = DEFAULT_RECIPIENT)]
        recipient: String,
        #[arg(long, env = "AURA_PHONE")]
        phone: Option<String>,
    },
    /// Show the Aura window
    Show,
    /// Hide the Aura window
    Hide,
    /// Open the crystal wheel in the running Aura window
    Wheel,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    // same resolution as the GUI: --pin, then AURA_PIN / config.toml
    let pin = cli
        .pin
        .map(Pin::new)
        .unwrap_or_else(|| config::load_or_default().pin);

    match cli.command {
        Commands::Unlock { input } => {
            unlock(FileStore::open_default()?, pin, &input)?;
            println!("Access granted");
            Ok(())
        }
        Commands::Lock => {
            lock(FileStore::open_default()?, pin)?;
            if let Err(e) = send_command(ControlCommand::Lock) {
                log::debug!("Aura is not running: {}", e);
            }
            println!("Locked");
            Ok(())
        }
        Commands::Status => {
            let gate = Gate::mount(FileStore::open_default()?, pin, None);
            println!("{}", if gate.is_granted() { "unlocked" } else { "locked" });
            Ok(())
        }
        Commands::Spin { seed } => spin(seed),
        Commands::Link {
            name,
            email,
            message,
            mode,
            recipient,
            phone,
        } => {
            let form = ContactForm {
                name,
                email,
                message,
                mode,
            };
            let phone = phone.map(PhoneNumber::new).unwrap_or_default();
            match form.messaging_link(&phone, &recipient) {
                Ok(link) => {
                    println!("{}", link);
                    Ok(())
                }
                Err(LinkError::Invalid(errors)) => {
                    let reasons: Vec<&str> =
                        [errors.name, errors.email].into_iter().flatten().collect();
                    anyhow::bail!("{}", reasons.join(" "))
                }
            }
        }
        Commands::Show => send_command(ControlCommand::Show),
        Commands::Hide => send_command(ControlCommand::Hide),
        Commands::Wheel => send_command(ControlCommand::Wheel),
    }
}

fn unlock<S: FlagStore>(store: S, pin: Pin, input: &str) -> anyhow::Result<()> {
    let mut gate = Gate::mount(store, pin, None);
    if gate.check_access(input) == AccessOutcome::Denied {
        anyhow::bail!("{}", gate.error().unwrap_or("Access denied"));
    }
    if !gate.is_persistent() {
        anyhow::bail!("PIN accepted but the access flag could not be saved");
    }
    Ok(())
}

fn lock<S: FlagStore>(store: S, pin: Pin) -> anyhow::Result<()> {
    let mut gate = Gate::mount(store, pin, None);
    gate.logout();
    if !gate.is_persistent() {
        anyhow::bail!("The stored access flag could not be removed");
    }
    Ok(())
}

fn spin(seed: Option<u64>) -> anyhow::Result<()> {
    let catalog = catalog::current();
    let rng = seed.map(Prng::new).unwrap_or_else(Prng::from_clock);
    let mut wheel = Wheel::new(catalog.crystals.len(), rng);

    if wheel.spin().is_none() {
        anyhow::bail!("The catalog has no crystals to spin");
    }
    let crystal = wheel
        .complete()
        .and_then(|i| catalog.crystal(i))
        .ok_or_else(|| anyhow::anyhow!("Spin did not settle on a crystal"))?;

    println!("{}", crystal.name);
    println!("Descripción: {}", crystal.description);
    println!("Cuerpo: {}", crystal.body);
    println!("Beneficios: {}", crystal.benefits);
    println!("{}", crystal.message);
    Ok(())
}

fn send_command(cmd: ControlCommand) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to aura at {}: {}. Is aura running?",
            SOCKET_PATH,
            e
        )
    })?;

    writeln!(stream, "{}", cmd)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurakit::gate::STORAGE_KEY;
    use aurakit::store::{DisabledStore, MemoryStore, StorageKey};

    #[test]
    fn test_unlock_reports_unsaved_flag() {
        assert!(unlock(MemoryStore::new(), Pin::new("2233"), "2233").is_ok());
        assert!(unlock(MemoryStore::new(), Pin::new("2233"), "1111").is_err());
        assert!(unlock(DisabledStore, Pin::new("2233"), "2233").is_err());
    }

    #[test]
    fn test_lock_reports_unremoved_flag() {
        let mut store = MemoryStore::new();
        store.write(&StorageKey::new(STORAGE_KEY), "true").unwrap();
        assert!(lock(store, Pin::default()).is_ok());
        assert!(lock(MemoryStore::new(), Pin::default()).is_ok());

        assert!(lock(DisabledStore, Pin::default()).is_err());
    }
}
