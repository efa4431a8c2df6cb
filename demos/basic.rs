use dhp_rule_miner::{mine, report::Report, MiningParams};

fn main() {
    // make transactions
    let transactions = vec![
        vec!["bread", "milk"],
        vec!["bread", "diaper", "beer", "eggs"],
        vec!["milk", "diaper", "beer", "cola"],
        vec!["bread", "milk", "diaper", "beer"],
        vec!["bread", "milk", "diaper", "cola"],
    ];

    // 3 of 5 transactions, 60% confidence
    let params = MiningParams::new(3, 0.6).expect("valid thresholds");
    let mut result = mine(transactions, &params).expect("mining succeeds");

    // print result
    println!("{}", Report::new(&result));

    result.rules.sort_by_lift();
    println!("{:#?}", result.rules);
}
