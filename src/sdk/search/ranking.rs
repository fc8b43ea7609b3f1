use crate::sdk::carpark::Carpark;

/// `rate × duration`, rounded half away from zero to cents.
pub fn total_cost(rate_per_hour: f64, duration_hours: f64) -> f64 {
    round_to_cents(rate_per_hour * duration_hours)
}

fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Prices every candidate for `duration_hours`, drops those farther than
/// `radius_m`, and orders the rest from cheapest. Equal costs keep input order.
pub fn rank_carparks(candidates: Vec<Carpark>, duration_hours: f64, radius_m: f64) -> Vec<Carpark> {
    let mut ranked: Vec<Carpark> = candidates
        .into_iter()
        .map(|carpark| Carpark {
            total_cost: total_cost(carpark.rate_per_hour, duration_hours),
            ..carpark
        })
        .filter(|carpark| carpark.distance_m <= radius_m)
        .collect();

    // Vec::sort_by is stable
    ranked.sort_by(|a, b| a.total_cost.total_cmp(&b.total_cost));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::carpark::CarparkType;
    use chrono::Utc;

    fn candidate(id: &str, rate: f64, distance: f64) -> Carpark {
        Carpark {
            id: id.to_string(),
            name: id.to_string(),
            kind: CarparkType::Ura,
            address: String::new(),
            latitude: 1.3,
            longitude: 103.8,
            distance_m: distance,
            walk_time_min: 5,
            total_cost: 0.0,
            rate_per_hour: rate,
            available_lots: 10,
            total_lots: 20,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn cost_is_rounded_to_cents() {
        assert_eq!(total_cost(1.2, 3.0), 3.6);
        assert_eq!(total_cost(1.7, 3.0), 5.1);
        assert_eq!(total_cost(0.8, 0.5), 0.4);
        assert_eq!(total_cost(1.333, 1.0), 1.33);
    }

    #[test]
    fn ranks_ascending_within_radius() {
        let ranked = rank_carparks(
            vec![
                candidate("far-cheap", 0.5, 1500.0),
                candidate("pricey", 2.0, 300.0),
                candidate("edge", 1.0, 1000.0),
                candidate("mid", 1.5, 10.0),
            ],
            2.0,
            1000.0,
        );

        let ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["edge", "mid", "pricey"]);
        assert!(ranked.windows(2).all(|w| w[0].total_cost <= w[1].total_cost));
        assert!(ranked.iter().all(|c| c.distance_m <= 1000.0));
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = rank_carparks(
            vec![
                candidate("b", 1.0, 10.0),
                candidate("a", 1.0, 20.0),
                candidate("c", 0.5, 30.0),
            ],
            1.0,
            100.0,
        );
        let ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let input = vec![candidate("x", 1.1, 5.0), candidate("y", 0.9, 5.0)];
        let once = rank_carparks(input, 3.0, 100.0);
        let twice = rank_carparks(once.clone(), 3.0, 100.0);
        assert_eq!(once, twice);
    }
}
