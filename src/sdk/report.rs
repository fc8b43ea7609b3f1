use super::carpark::{Availability, Carpark, SearchState, SearchStatus};
use std::fmt::Write;

pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round())
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

pub fn rank_badge(rank: usize) -> Option<&'static str> {
    match rank {
        1 => Some("Cheapest"),
        2 => Some("2nd"),
        3 => Some("3rd"),
        _ => None,
    }
}

pub fn format_availability(carpark: &Carpark) -> String {
    if carpark.is_full() {
        return "Full".to_string();
    }
    let level = match carpark.availability() {
        Availability::High => "plenty",
        Availability::Limited => "limited",
        Availability::Low => "few left",
        Availability::Unknown => "unknown",
    };
    format!(
        "{} / {} lots available ({})",
        carpark.available_lots, carpark.total_lots, level
    )
}

/// Plain-text view of a search state, one carpark per block.
pub fn render_search_state(state: &SearchState, duration_hours: f64) -> String {
    let mut out = String::new();
    match state.status {
        SearchStatus::Idle => out.push_str("Enter a destination to compare parking prices.\n"),
        SearchStatus::Loading => out.push_str("Finding cheapest carparks...\n"),
        SearchStatus::Empty => out.push_str("No carparks found nearby. Try a larger radius.\n"),
        SearchStatus::Error => {
            let message = state.error.as_deref().unwrap_or("Search failed.");
            let _ = writeln!(out, "Error: {}", message);
        }
        SearchStatus::Success => {
            let count = state.results.len();
            let _ = writeln!(
                out,
                "{} carpark{} found, sorted by price",
                count,
                if count == 1 { "" } else { "s" }
            );
            for (index, carpark) in state.results.iter().enumerate() {
                out.push('\n');
                out.push_str(&render_carpark(carpark, index + 1, duration_hours));
            }
        }
    }
    out
}

fn render_carpark(carpark: &Carpark, rank: usize, duration_hours: f64) -> String {
    let mut out = String::new();
    let badge = rank_badge(rank)
        .map(|b| format!(" [{}]", b))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{}. {} ({}){}  ${:.2} for {}h",
        rank, carpark.name, carpark.kind, badge, carpark.total_cost, duration_hours
    );
    let _ = writeln!(
        out,
        "   {} | {} min walk | ${:.2}/hr",
        format_distance(carpark.distance_m),
        carpark.walk_time_min,
        carpark.rate_per_hour
    );
    let _ = writeln!(out, "   {}", carpark.address);
    let _ = writeln!(out, "   {}", format_availability(carpark));
    out
}
