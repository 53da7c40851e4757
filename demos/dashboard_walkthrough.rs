//! Load incidents -> click a pie slice -> brush months -> read every view.

use sar_crossfilter::cli::commands::render_text;
use sar_crossfilter::*;

const INCIDENTS: &str = "\
SourceAgency,Category,Environment,date,year,ConfirmedLatitude,ConfirmedLongitude
Police,Land,Land,2020-01-05,2020,-41.0,174.0
RCCNZ,Marine,Marine,2020-01-17,2020,-40.5,173.5
Police,Marine,Marine,2020-02-03,2020,-36.8,174.7
Coastguard,Marine,Inland water,2020-03-11,2020,-38.1,176.2
RCCNZ,Air,Land,2020-03-20,2020,-45.0,168.7
Police,Land,Land,2020-04-01,2020,-43.5,172.6
Police,Land,Marine,2020-04-15,2020,-41.0,174.0
";

fn main() -> XfResult<()> {
    let mut dashboard = Dashboard::from_reader(INCIDENTS.as_bytes(), DashboardConfig::default())?;
    dashboard.set_redraw_hook(Box::new(|snapshot: &DashboardSnapshot| {
        println!(
            "-- redraw: {} of {} incidents selected",
            snapshot.selected, snapshot.total
        );
    }));

    println!("{}", render_text(&dashboard.snapshot()?));

    // Click the Marine slice
    dashboard.apply(View::Category, Gesture::ToggleKey(Key::from("Marine")))?;

    // Brush February through March
    let feb = chrono::NaiveDate::from_ymd_opt(2020, 2, 1).unwrap_or_default();
    let apr = chrono::NaiveDate::from_ymd_opt(2020, 4, 1).unwrap_or_default();
    let snapshot = dashboard.apply(
        View::Monthly,
        Gesture::Brush {
            from: Key::Date(feb),
            to: Key::Date(apr),
        },
    )?;
    println!("{}", render_text(&snapshot));

    // The same engine, used directly: counts per environment under a category filter
    let mut xf = CrossFilter::with_records(load_incidents(INCIDENTS.as_bytes())?)?;
    let category = xf.named_dimension("category", |i: &Incident| Key::from(i.category.as_str()))?;
    let environment =
        xf.named_dimension("environment", |i: &Incident| Key::from(i.environment.as_str()))?;
    let by_environment = xf.group_count(environment)?;
    let delta = xf.filter(category, Filter::exact("Land"))?;
    println!("Land filter: {} entered, {} left", delta.entered.len(), delta.left.len());
    for (key, count) in xf.all(by_environment)? {
        println!("  {}: {}", key, count);
    }

    dashboard.reset_all()?;
    Ok(())
}
