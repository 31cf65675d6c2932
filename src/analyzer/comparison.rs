use crate::model::{Comparison, GrowthWindow, PeriodComparison};
use crate::utils::round2;

/// Compares local growth against the national baseline for every period both
/// windows report. Periods missing on either side are left out.
pub fn compare_to_national(local: &GrowthWindow, national: &GrowthWindow) -> Comparison {
    local
        .iter()
        .filter_map(|(period, local_rate)| {
            let local_rate = local_rate?;
            let national_rate = national.get(period)?;
            let difference = round2(local_rate - national_rate);
            let outperforming = local_rate > national_rate;
            let performance_description = format!(
                "{} national average by {:.1} p.p.",
                if outperforming { "Outperforming" } else { "Underperforming" },
                difference.abs()
            );
            Some((
                period,
                PeriodComparison {
                    local_rate,
                    national_rate,
                    difference,
                    outperforming,
                    performance_description,
                },
            ))
        })
        .collect()
}
