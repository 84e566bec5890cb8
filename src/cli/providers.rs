//! Providers command - prints every accepted `chat_model_name`

use crate::domain::ProviderKind;

pub fn run() -> anyhow::Result<()> {
    for kind in ProviderKind::ALL {
        println!("{}", kind.identifiers().join(", "));
    }

    Ok(())
}
