//! Report codec negotiation results.

use layercast_capture::{first_supported, probe_report, CODEC_CANDIDATES};

pub fn run() -> anyhow::Result<()> {
    println!("Layercast Codec Report");
    println!("{}", "=".repeat(50));

    let report = probe_report()?;
    for (codec, elements) in &report {
        let supported = elements.iter().all(|(_, ok)| *ok);
        let marker = if supported { "[OK]  " } else { "[MISS]" };
        println!("{marker} {} -> {} (.{})", codec.name, codec.mime_type, codec.extension);
        for (element, ok) in elements {
            println!("       {} {element}", if *ok { "+" } else { "-" });
        }
    }

    println!();
    let available: std::collections::HashSet<&str> = report
        .iter()
        .flat_map(|(_, elements)| elements.iter())
        .filter(|(_, ok)| *ok)
        .map(|(name, _)| *name)
        .collect();
    match first_supported(CODEC_CANDIDATES, |e| available.contains(e)) {
        Some(codec) => println!("Negotiated: {} ({})", codec.name, codec.mime_type),
        None => println!("No supported recording codec found."),
    }

    Ok(())
}
