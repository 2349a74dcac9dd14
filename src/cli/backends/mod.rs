//! Backends command - lists the selectable backend kinds

use crate::domain::storage::BackendKind;

pub fn run() -> anyhow::Result<()> {
    for line in describe() {
        println!("{}", line);
    }
    Ok(())
}

fn describe() -> Vec<String> {
    BackendKind::ALL
        .into_iter()
        .map(|kind| {
            let port = kind
                .default_port()
                .map(|port| format!(", default port {}", port))
                .unwrap_or_default();
            format!("{:<36} aliases: {}{}", kind.as_str(), kind.aliases().join(", "), port)
        })
        .collect()
}
