// The comparison chart, described as JSON so that any plotting tool can draw it.

use crate::rank::*;

pub const CHART_TITLE: &str = "Staff Performance Ratings Comparison";

/// A grouped bar chart: for each participant, in rank order, the self rating
/// next to the average rating received from the others.
pub fn build_chart_js(results: &[ParticipantResult]) -> JSValue {
    let categories: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    let self_values: Vec<f64> = results.iter().map(|r| round_2(r.self_rating)).collect();
    let others_values: Vec<f64> = results
        .iter()
        .map(|r| round_2(r.others_average_rating))
        .collect();
    json!({
        "title": CHART_TITLE,
        "kind": "groupedBar",
        "xLabel": "Staff",
        "yLabel": "Ratings",
        "categories": categories,
        "series": [
            {"label": "Self Rating", "color": "skyblue", "values": self_values},
            {"label": "Others Average Rating", "color": "lightgreen", "values": others_values},
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_follows_rank_order() {
        let names: Vec<String> = vec!["Asha".to_string(), "Ben".to_string(), "Chloe".to_string()];
        let m = RatingMatrix::from_scores(
            &names,
            &[
                vec![6.0, 5.0, 5.0],
                vec![9.0, 7.0, 9.0],
                vec![9.0, 9.0, 8.0],
            ],
        );
        let results = compute_ranking(&m, &AggregationRules::DEFAULT_RULES).unwrap();
        let js = build_chart_js(&results);
        assert_eq!(js["title"], json!(CHART_TITLE));
        let categories = js["categories"].as_array().unwrap();
        assert_eq!(categories.len(), 3);
        assert_eq!(categories[0], json!(results[0].name));

        let series = js["series"].as_array().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0]["label"], json!("Self Rating"));
        assert_eq!(series[1]["color"], json!("lightgreen"));
        let others = series[1]["values"].as_array().unwrap();
        assert_eq!(others[0], json!(round_2(results[0].others_average_rating)));
    }

    #[test]
    fn empty_chart() {
        let js = build_chart_js(&[]);
        assert_eq!(js["categories"], json!([]));
    }
}
