use std::path::Path;

use anyhow::bail;
use linestack_core::StackConfig;

pub fn init(path: &str, account: &str, region: &str, repository: &str) -> anyhow::Result<()> {
    let output = Path::new(path).join("stack.toml");
    if output.exists() {
        bail!("{} already exists", output.display());
    }

    let config = StackConfig::scaffold(account, region, repository);
    // Fail before writing if the scaffold would not resolve.
    config.resolve()?;

    std::fs::write(&output, config.to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
