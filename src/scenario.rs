//! Business problem catalog
//!
//! A static mapping from a human-readable problem name to its metadata
//! (suggested visualization type, complexity tier, numeric identifier).
//! Free-form prompts are not part of the catalog and carry `problem_id` 0.

use serde::Serialize;

/// Complexity tier of a business problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Complexity {
    Easy,
    Medium,
    Complex,
}

impl Complexity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Complex => "Complex",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predefined business question paired with a suggested chart type
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioDefinition {
    /// Unique human-readable name, the catalog key
    pub name: &'static str,
    /// Suggested chart type for the problem
    pub visualization_type: &'static str,
    pub complexity: Complexity,
    /// Numeric identifier, >= 1; 0 is reserved for free-form prompts
    pub problem_id: u32,
}

impl ScenarioDefinition {
    /// The prompt text submitted to the models for this scenario
    pub fn prompt(&self) -> String {
        format!("{} using {}", self.name, self.visualization_type)
    }
}

const fn scenario(
    name: &'static str,
    visualization_type: &'static str,
    complexity: Complexity,
    problem_id: u32,
) -> ScenarioDefinition {
    ScenarioDefinition {
        name,
        visualization_type,
        complexity,
        problem_id,
    }
}

static CATALOG: [ScenarioDefinition; 18] = [
    scenario(
        "Profitability by Customer Segment",
        "Bar chart (Profit by Segment, % of total)",
        Complexity::Easy,
        1,
    ),
    scenario(
        "Top 10 Products by Sales Volume",
        "Horizontal bar chart (Product Name vs Sales)",
        Complexity::Easy,
        2,
    ),
    scenario(
        "Customer Profitability Analysis",
        "Table or bar chart (Top 10 Customers by Total Profit)",
        Complexity::Easy,
        3,
    ),
    scenario(
        "Sales Distribution Across Regions",
        "Pie chart (Region-wise Sales %)",
        Complexity::Easy,
        4,
    ),
    scenario(
        "Segment-wise Purchase Behavior",
        "Bar chart (Avg Quantity Purchased per Segment)",
        Complexity::Easy,
        5,
    ),
    scenario(
        "Top 5 Most Profitable Cities",
        "Horizontal bar chart (City vs Total Profit)",
        Complexity::Easy,
        6,
    ),
    scenario(
        "Profit Relationship Across Product Categories",
        "Scatter plot (Sales vs Profit, point size = Quantity)",
        Complexity::Medium,
        7,
    ),
    scenario(
        "Regional Profit Contribution",
        "Stacked bar chart (Profit by Region and Category)",
        Complexity::Medium,
        8,
    ),
    scenario(
        "Impact of Discounts on Profit Margins",
        "Line chart (Avg Discount vs Avg Profit per Order)",
        Complexity::Medium,
        9,
    ),
    scenario(
        "Sub-Category Performance (Profit vs. Discount)",
        "Dual-axis line chart (Profit and Discount % by Sub-Category)",
        Complexity::Medium,
        10,
    ),
    scenario(
        "Discount Effectiveness by Category",
        "Grouped bar chart (Profit and Discount % per Category)",
        Complexity::Medium,
        11,
    ),
    scenario(
        "State-Level Profitability Analysis",
        "Treemap (States sized by Profit, color = Region)",
        Complexity::Medium,
        12,
    ),
    scenario(
        "Customer Loyalty vs. Profitability",
        "Scatter plot (Total Purchases per Customer vs Total Profit)",
        Complexity::Medium,
        13,
    ),
    scenario(
        "Product Sales Distribution by Cities",
        "Maps",
        Complexity::Medium,
        14,
    ),
    scenario(
        "Product Profitability Efficiency (Profit/Sales Ratio)",
        "Scatter plot (Profit/Sales Ratio vs Product Name, color = Category)",
        Complexity::Medium,
        15,
    ),
    scenario(
        "Product Sub-Category Risk Assessment (High Discounts, Low Profit)",
        "Heatmap (Sub-Category vs Discount vs Profit Margin)",
        Complexity::Complex,
        16,
    ),
    scenario(
        "Market Basket Analysis - Frequently Purchased Items",
        "Network graph",
        Complexity::Complex,
        17,
    ),
    scenario(
        "Correlation Between Discount and Sales Volume",
        "Pair plot or scatter plot with trendline",
        Complexity::Complex,
        18,
    ),
];

/// All scenarios in catalog order
pub fn catalog() -> &'static [ScenarioDefinition] {
    &CATALOG
}

/// Look up a scenario by its name
pub fn find(name: &str) -> Option<&'static ScenarioDefinition> {
    CATALOG.iter().find(|s| s.name == name)
}

/// The problem id recorded for a prompt: the scenario's id, or 0 for free-form
pub fn problem_id_for(scenario_name: Option<&str>) -> u32 {
    scenario_name
        .and_then(find)
        .map(|s| s.problem_id)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_has_eighteen_unique_problems() {
        assert_eq!(catalog().len(), 18);
        let ids: HashSet<u32> = catalog().iter().map(|s| s.problem_id).collect();
        assert_eq!(ids.len(), 18);
        assert!(catalog().iter().all(|s| s.problem_id >= 1));
        let names: HashSet<&str> = catalog().iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 18);
    }

    #[test]
    fn find_matches_exact_name() {
        let s = find("Sales Distribution Across Regions").unwrap();
        assert_eq!(s.problem_id, 4);
        assert_eq!(s.complexity, Complexity::Easy);
        assert!(find("No Such Problem").is_none());
    }

    #[test]
    fn prompt_combines_name_and_chart_type() {
        let s = find("Market Basket Analysis - Frequently Purchased Items").unwrap();
        assert_eq!(
            s.prompt(),
            "Market Basket Analysis - Frequently Purchased Items using Network graph"
        );
    }

    #[test]
    fn problem_id_is_zero_iff_free_form() {
        assert_eq!(problem_id_for(None), 0);
        assert_eq!(problem_id_for(Some("not in the catalog")), 0);
        assert_eq!(
            problem_id_for(Some("Profitability by Customer Segment")),
            1
        );
    }
}
