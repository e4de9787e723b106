//! Walk a scripted travel day through the whole navigation stack.

use wayfare_core::catalog::RuleKey;
use wayfare_core::testing::Scenario;
use wayfare_core::NavigationForm;

async fn click(form: &NavigationForm, scenario: &Scenario, index: usize, key: RuleKey) {
    if let Some(notice) = form
        .rule_clicked(&scenario.party, &scenario.select(index), key)
        .await
    {
        println!("Notice: {}", notice.text());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== A scripted travel day ===\n");

    let scenario = Scenario::new();
    let form = scenario.gm_form(&scenario.select(0))?;

    println!("Party: {}", scenario.party.name);
    for traveler in &scenario.party.travelers {
        println!("  - {} (level {})", traveler.name, traveler.level);
    }
    println!("Date: {}\n", scenario.usage.today());

    // The guide orients (DC 15) and forages water twice (DC 10)
    scenario.expect_total(17);
    click(&form, &scenario, 0, RuleKey::Orient).await;
    scenario.expect_total(8);
    click(&form, &scenario, 0, RuleKey::ForageWater).await;
    scenario.expect_total(12);
    click(&form, &scenario, 0, RuleKey::ForageWater).await;

    // The scholar hunts spices; the talker assists
    scenario.expect_total(14);
    click(&form, &scenario, 1, RuleKey::ForageSpices).await;
    click(&form, &scenario, 2, RuleKey::Assist).await;

    // A second orient attempt runs into the daily cap
    click(&form, &scenario, 0, RuleKey::Orient).await;
    println!();

    println!("--- Chat transcript ---");
    for message in scenario.chat.posts() {
        println!("[{}] {}", message.speaker, message.text);
    }

    println!("\n--- Usage after the day ---");
    let data = form.data(&scenario.party, &scenario.select(0)).await?;
    for row in &data.rules {
        let dc = row
            .dc
            .map(|dc| format!("DC {dc}"))
            .unwrap_or_else(|| "no check".to_string());
        println!(
            "  {:<18} {}/{} used ({dc})",
            row.label, row.used, row.daily_max
        );
    }

    println!("\n=== Day complete ===");
    Ok(())
}
