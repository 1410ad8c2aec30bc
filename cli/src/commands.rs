use anyhow::{bail, Context, Result};
use fairwheel_shared::constants::DEFAULT_WEIGHT;
use fairwheel_shared::entry::arcs;
use fairwheel_shared::{
    decode_or_default, encode, select_winner_with, Frame, OsRandom, SecureRandom, SeededRandom, SharedEntry,
    SpinConfig, Wheel, WheelSnapshot,
};
use tracing::{info, warn};

fn random_source(seed: Option<u64>) -> Box<dyn SecureRandom> {
    match seed {
        Some(seed) => {
            info!("Using seeded generator ({}); results are reproducible, not secret", seed);
            Box::new(SeededRandom::new(seed))
        }
        None => Box::new(OsRandom),
    }
}

fn snapshot_from_args(labels: &[String], weights: &[u32]) -> Result<WheelSnapshot> {
    if !weights.is_empty() && weights.len() != labels.len() {
        bail!("Got {} weights for {} labels", weights.len(), labels.len());
    }
    let entries = labels
        .iter()
        .enumerate()
        .map(|(i, label)| SharedEntry {
            label: label.clone(),
            color: fairwheel_shared::entry::palette_color(i).to_string(),
            weight: weights.get(i).copied().unwrap_or(DEFAULT_WEIGHT),
        })
        .collect();
    Ok(WheelSnapshot {
        entries,
        name: None,
        history: Vec::new(),
    })
}

fn print_wheel(wheel: &Wheel) -> Result<()> {
    println!("Wheel: {}", wheel.name().unwrap_or("(unnamed)"));
    if wheel.entries().is_empty() {
        println!("  (no entries)");
    } else {
        let spans = arcs(wheel.entries())?;
        for (entry, arc) in wheel.entries().iter().zip(spans) {
            println!(
                "  {:<24} {:>8} weight {:>4}  {:6.2}% of the wheel",
                entry.label,
                entry.color,
                entry.weight,
                arc.span() / 3.6
            );
        }
    }
    if !wheel.history().is_empty() {
        println!("History: {}", wheel.history().join(", "));
    }
    Ok(())
}

pub fn spin(labels: &[String], weights: &[u32], config: SpinConfig, fps: u32, seed: Option<u64>) -> Result<()> {
    let snapshot = snapshot_from_args(labels, weights)?;
    let mut wheel = Wheel::from_snapshot(snapshot, config)?;
    let mut rng = random_source(seed);

    let outcome = wheel.start_spin(rng.as_mut(), 0.0)?;
    info!(
        "Committed to entry {} before animating ({} extra turns)",
        outcome.winning_index, outcome.extra_turns
    );

    let step_ms = 1000.0 / f64::from(fps.max(1));
    let mut now_ms = 0.0;
    loop {
        match wheel.tick(now_ms)? {
            Frame::Turning { angle, progress } => {
                println!("{:>8.0}ms  {:>10.2}°  {:>5.1}%", now_ms, angle, progress * 100.0);
            }
            Frame::Finished(result) => {
                println!("{:>8.0}ms  {:>10.2}°  100.0%", now_ms, wheel.rotation());
                println!("Winner: {}", result.entry.label);
                break;
            }
            Frame::Idle { .. } => bail!("Spin ended without a result"),
        }
        now_ms += step_ms;
    }
    Ok(())
}

pub fn share(
    labels: &[String],
    weights: &[u32],
    name: Option<String>,
    history: Vec<String>,
    config: SpinConfig,
) -> Result<()> {
    let mut snapshot = snapshot_from_args(labels, weights)?;
    snapshot.name = name;
    snapshot.history = history;
    // round through a wheel so the link only carries valid entries
    let wheel = Wheel::from_snapshot(snapshot, config)?;
    let token = encode(&wheel.snapshot()).context("Wheel cannot be shared")?;
    println!("{}", token);
    Ok(())
}

pub fn open(token: &str, json: bool, config: SpinConfig) -> Result<()> {
    let snapshot = decode_or_default(token);
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    let wheel = Wheel::from_snapshot(snapshot, config.clone()).unwrap_or_else(|e| {
        warn!("Share link does not describe a usable wheel: {}", e);
        Wheel::new(config)
    });
    print_wheel(&wheel)
}

/// Pearson's chi-square statistic of observed counts against expected shares.
pub fn chi_square(counts: &[u64], shares: &[f64]) -> f64 {
    let total: u64 = counts.iter().sum();
    counts
        .iter()
        .zip(shares)
        .map(|(&observed, &share)| {
            let expected = total as f64 * share;
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

pub fn simulate(labels: &[String], weights: &[u32], spins: u32, seed: Option<u64>, config: SpinConfig) -> Result<()> {
    let snapshot = snapshot_from_args(labels, weights)?;
    let wheel = Wheel::from_snapshot(snapshot, config.clone())?;
    let entries = wheel.entries();
    let mut rng = random_source(seed);

    let mut counts = vec![0u64; entries.len()];
    for _ in 0..spins {
        let outcome = select_winner_with(entries, rng.as_mut(), &config)?;
        counts[outcome.winning_index] += 1;
    }

    let total_weight: u64 = entries.iter().map(|e| u64::from(e.weight)).sum();
    let shares: Vec<f64> = entries
        .iter()
        .map(|e| f64::from(e.weight) / total_weight as f64)
        .collect();

    println!("{:<24} {:>10} {:>10} {:>10}", "entry", "wins", "observed", "expected");
    for ((entry, count), share) in entries.iter().zip(&counts).zip(&shares) {
        println!(
            "{:<24} {:>10} {:>9.3}% {:>9.3}%",
            entry.label,
            count,
            *count as f64 / f64::from(spins.max(1)) * 100.0,
            share * 100.0
        );
    }
    if spins > 0 && entries.len() > 1 {
        println!(
            "chi-square {:.3} with {} degrees of freedom",
            chi_square(&counts, &shares),
            entries.len() - 1
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_snapshot_from_args() {
        let snapshot = snapshot_from_args(&labels(&["Pizza", "Sushi"]), &[3, 1]).unwrap();
        assert_eq!(snapshot.entries[0].weight, 3);
        assert_eq!(snapshot.entries[1].label, "Sushi");

        let unweighted = snapshot_from_args(&labels(&["Pizza", "Sushi"]), &[]).unwrap();
        assert!(unweighted.entries.iter().all(|e| e.weight == DEFAULT_WEIGHT));
    }

    #[test]
    fn test_weight_count_must_match() {
        assert!(snapshot_from_args(&labels(&["Pizza", "Sushi"]), &[1]).is_err());
    }

    #[test]
    fn test_chi_square() {
        assert_eq!(chi_square(&[50, 50], &[0.5, 0.5]), 0.0);
        assert!((chi_square(&[60, 40], &[0.5, 0.5]) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_commands_run() {
        let names = labels(&["Pizza", "Sushi", "Tacos"]);
        let config = SpinConfig {
            duration_ms: 500.0,
            ..SpinConfig::default()
        };
        spin(&names, &[], config.clone(), 30, Some(3)).unwrap();
        simulate(&names, &[1, 1, 2], 1000, Some(3), config.clone()).unwrap();
        share(&names, &[], Some("Lunch".to_string()), labels(&["Pizza"]), config.clone()).unwrap();
        open("not-a-valid-token", false, config).unwrap();
    }
}
