mod common;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

use common::{ORDERS_FIXTURE, TestWorkspace, fixture_path};

fn retail_insights() -> Command {
    Command::cargo_bin("retail-insights").expect("binary exists")
}

#[test]
fn dashboard_renders_fixture_sections() {
    let input = fixture_path(ORDERS_FIXTURE);
    retail_insights()
        .args(["dashboard", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Global Retail Performance Dashboard"))
        .stdout(contains("Total Revenue"))
        .stdout(contains("$4,759"))
        .stdout(contains("Total Profit"))
        .stdout(contains("Units Sold"))
        .stdout(contains("2023-05"))
        .stdout(contains("Technology"))
        .stdout(contains("Raw Data").not());
}

#[test]
fn dashboard_show_data_adds_preview() {
    let input = fixture_path(ORDERS_FIXTURE);
    retail_insights()
        .args([
            "dashboard",
            "-i",
            input.to_str().unwrap(),
            "--show-data",
            "--preview-rows",
            "3",
        ])
        .assert()
        .success()
        .stdout(contains("Raw Data (first 3 of 12 row(s))"))
        .stdout(contains("CA-2023-1003"))
        .stdout(contains("CA-2023-1004").not());
}

#[test]
fn dashboard_json_reports_kpis_and_series() {
    let input = fixture_path(ORDERS_FIXTURE);
    let output = retail_insights()
        .args(["dashboard", "-i", input.to_str().unwrap(), "--format", "json"])
        .output()
        .expect("run dashboard");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse json");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["kpis"]["revenue"]["display"], "$4,759");
    assert_eq!(json["kpis"]["quantity"]["label"], "Units Sold");
    assert_eq!(json["monthly_sales"][0]["month"], "2023-01");
    assert_eq!(json["top_categories"][0]["category"], "Technology");
    assert_eq!(json["roles"]["date"], "order_date");
    assert_eq!(json["encoding"], "UTF-8");
    assert_eq!(json["preview"]["total_rows"], 12);
    assert_eq!(json["preview"]["rows"].as_array().map(Vec::len), Some(12));
}

#[test]
fn dashboard_json_preview_honours_row_limit() {
    let input = fixture_path(ORDERS_FIXTURE);
    let output = retail_insights()
        .args([
            "dashboard",
            "-i",
            input.to_str().unwrap(),
            "--format",
            "json",
            "--preview-rows",
            "2",
        ])
        .output()
        .expect("run dashboard");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse json");
    assert_eq!(json["preview"]["rows"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["preview"]["columns"][0]["name"], "order_id");
}

#[test]
fn header_only_file_counts_zero_orders() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", "Sales,Category,Quantity\n");
    retail_insights()
        .args(["dashboard", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Total Orders"))
        .stdout(contains("Records Analyzed"))
        .stdout(contains("Avg. Order Value").not())
        .stdout(contains("$-0").not());
}

#[test]
fn missing_input_renders_only_the_error() {
    let workspace = TestWorkspace::new();
    let input = workspace.path().join("orders.csv");
    retail_insights()
        .args(["dashboard", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(contains("Error loading data:"))
        .stdout(contains("Key Metrics").not());
}

#[test]
fn dashboard_warns_when_roles_are_missing() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", "customer,region\nAna,North\nBo,South\n");
    retail_insights()
        .args(["dashboard", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Total Orders"))
        .stdout(contains("Records Analyzed"))
        .stdout(contains(
            "warning: Could not identify Date or Sales columns for trend analysis.",
        ))
        .stdout(contains("warning: Could not identify Category information."));
}

#[test]
fn roles_command_lists_assignment() {
    let input = fixture_path(ORDERS_FIXTURE);
    retail_insights()
        .args(["roles", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("sales     sales"))
        .stdout(contains("category  category"))
        .stdout(contains("date      order_date  datetime"));
}

#[test]
fn role_mapping_file_overrides_inference() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "orders.csv",
        "Order Date,Net Amount,Segment,Sales\n2024-01-02,10,Home,1\n2024-01-09,5,Office,2\n",
    );
    let mapping = workspace.write("roles.yml", "sales: Net Amount\ncategory: Segment\n");
    retail_insights()
        .args([
            "dashboard",
            "-i",
            input.to_str().unwrap(),
            "--roles",
            mapping.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("$15"))
        .stdout(contains("Home"));
}

#[test]
fn malformed_role_mapping_is_a_config_error() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", "sales\n1\n");
    let mapping = workspace.write("roles.yml", "revenue: sales\n");
    retail_insights()
        .args([
            "roles",
            "-i",
            input.to_str().unwrap(),
            "--roles",
            mapping.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn preview_limits_rows() {
    let input = fixture_path(ORDERS_FIXTURE);
    retail_insights()
        .args(["preview", "-i", input.to_str().unwrap(), "--rows", "2"])
        .assert()
        .success()
        .stdout(contains("order_id"))
        .stdout(contains("CA-2023-1002"))
        .stdout(contains("CA-2023-1003").not());
}

#[test]
fn tab_separated_input_is_detected_by_extension() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.tsv", "Category\tSales\nToys\t12\nToys\t3\n");
    retail_insights()
        .args(["dashboard", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("$15"));
}
