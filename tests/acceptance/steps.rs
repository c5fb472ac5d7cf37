use crate::ExporterWorld;
use chrono::{DateTime, Duration, TimeZone, Utc};
use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use postmortem_exporter::collector::Collector;
use postmortem_exporter::github::Repository;
use postmortem_exporter::github::search::{POSTMORTEM_LABELS, build_query};
use postmortem_exporter::metrics::{NAMESPACE, OPEN_ISSUES_NAME, OpenIssuesGauge};

fn exposition(world: &ExporterWorld) -> String {
    world
        .gauge
        .as_ref()
        .expect("Repository must be configured first")
        .encode()
        .expect("Metrics should encode")
}

fn open_issue_series(exposition: &str) -> Vec<&str> {
    let prefix = format!("{NAMESPACE}_{OPEN_ISSUES_NAME}{{");
    exposition
        .lines()
        .filter(|line| line.starts_with(&prefix))
        .collect()
}

fn labels() -> Vec<String> {
    POSTMORTEM_LABELS.iter().map(|l| l.to_string()).collect()
}

#[given(regex = r#"^the repository "([^/"]+)/([^"]+)"$"#)]
async fn given_repository(world: &mut ExporterWorld, owner: String, name: String) {
    let repo = Repository::new(owner, name);
    let gauge = OpenIssuesGauge::new(&repo).expect("Gauge should register");
    world.collector = Some(Collector::new(
        world.tracker.clone(),
        repo,
        labels(),
        gauge.clone(),
    ));
    world.gauge = Some(gauge);
}

#[given("the tracker has these open postmortem issues:")]
async fn given_open_issues(world: &mut ExporterWorld, step: &Step) {
    let table = step.table.as_ref().expect("Step requires a table");
    for row in table.rows.iter().skip(1) {
        let created_at = DateTime::parse_from_rfc3339(&row[1])
            .unwrap_or_else(|e| panic!("Invalid timestamp {:?}: {}", row[1], e))
            .with_timezone(&Utc);
        world.tracker.open(&row[0], created_at);
    }
}

#[given(regex = r"^the tracker has (\d+) open postmortem issues$")]
async fn given_generated_issues(world: &mut ExporterWorld, count: usize) {
    let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    for n in 0..count {
        world
            .tracker
            .open(&format!("Incident {}", n + 1), base + Duration::hours(n as i64));
    }
}

#[given(regex = r"^the tracker fails after (\d+) pages?$")]
async fn given_tracker_fails(world: &mut ExporterWorld, pages: usize) {
    world.tracker.fail_after_pages(pages);
}

#[when("a collection cycle runs")]
async fn when_cycle_runs(world: &mut ExporterWorld) {
    world.tracker.clear_requests();
    let collector = world
        .collector
        .as_ref()
        .expect("Repository must be configured first");
    world.cycle_result = Some(collector.collect().await);
}

#[when(regex = r#"^the issue "(.*)" is closed$"#)]
async fn when_issue_closed(world: &mut ExporterWorld, title: String) {
    world.tracker.close(&title);
}

#[then(regex = r"^the cycle succeeds with (\d+) issues$")]
async fn then_cycle_succeeds(world: &mut ExporterWorld, expected: usize) {
    match world.cycle_result.as_ref().expect("No cycle has run") {
        Ok(count) => assert_eq!(*count, expected),
        Err(err) => panic!("Cycle failed: {err:#}"),
    }
}

#[then(regex = r#"^the cycle fails with "(.*)"$"#)]
async fn then_cycle_fails(world: &mut ExporterWorld, expected: String) {
    match world.cycle_result.as_ref().expect("No cycle has run") {
        Ok(count) => panic!("Cycle succeeded with {count} issues"),
        Err(err) => assert!(
            format!("{err:#}").contains(&expected),
            "Expected error containing '{}', got: {:#}",
            expected,
            err
        ),
    }
}

#[then(regex = r"^(\d+) search requests? (?:was|were) made$")]
async fn then_search_requests(world: &mut ExporterWorld, expected: usize) {
    let requests = world.tracker.requests();
    assert_eq!(requests.len(), expected, "Requests: {:#?}", requests);
    for request in &requests {
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, 100);
        assert_eq!(request.sort, "created");
        assert_eq!(request.order, "asc");
    }
}

#[then(regex = r"^the second search request starts after issue (\d+)$")]
async fn then_second_request_cursor(world: &mut ExporterWorld, position: usize) {
    let issues = world.tracker.sorted_issues();
    let cursor = issues[position - 1].created_at;
    let repo = Repository::new("acme", "widgets");
    let requests = world.tracker.requests();
    assert_eq!(requests[1].query, build_query(&repo, &labels(), Some(&cursor)));
}

#[then(regex = r"^exactly (\d+) open issue series (?:is|are) exposed$")]
async fn then_series_count(world: &mut ExporterWorld, expected: usize) {
    let text = exposition(world);
    assert_eq!(open_issue_series(&text).len(), expected, "Exposition:\n{}", text);
}

#[then(regex = r#"^the series for "(.*)" has value 1 with the repository labels$"#)]
async fn then_series_exposed(world: &mut ExporterWorld, title: String) {
    let text = exposition(world);
    let title_label = format!("title=\"{title}\"");
    let series: Vec<&str> = open_issue_series(&text)
        .into_iter()
        .filter(|line| line.contains(&title_label))
        .collect();
    assert_eq!(series.len(), 1, "Exposition:\n{}", text);
    let line = series[0];
    assert!(line.contains(r#"username="acme""#), "{}", line);
    assert!(line.contains(r#"reponame="widgets""#), "{}", line);
    assert!(line.contains(r#"full_reponame="acme/widgets""#), "{}", line);
    assert!(line.ends_with(" 1"), "{}", line);
}

#[then(regex = r#"^no series is exposed for "(.*)"$"#)]
async fn then_series_absent(world: &mut ExporterWorld, title: String) {
    let text = exposition(world);
    let title_label = format!("title=\"{title}\"");
    assert!(
        !open_issue_series(&text)
            .iter()
            .any(|line| line.contains(&title_label)),
        "Exposition:\n{}",
        text
    );
}
