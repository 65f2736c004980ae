//! Log viewer: last N lines of the safety log or one per-service log.

use yoloboot_core::services::SERVICE_NAMES;
use yoloboot_core::Paths;

pub fn run(service: Option<&str>, tail: usize) -> anyhow::Result<()> {
    let paths = Paths::from_env()?;

    let path = match service {
        None => paths.safety_log(),
        Some(name) => {
            if !SERVICE_NAMES.contains(&name) {
                anyhow::bail!(
                    "unknown service '{}'; expected one of: {}",
                    name,
                    SERVICE_NAMES.join(", ")
                );
            }
            paths.service_log(name)
        }
    };

    if !path.exists() {
        println!("no log at {} yet", path.display());
        return Ok(());
    }

    let content = std::fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    for line in lines.iter().skip(lines.len().saturating_sub(tail)) {
        println!("{line}");
    }
    Ok(())
}
