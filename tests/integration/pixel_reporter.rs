//! Stats pixel delivery against a mock HTTP server.

use std::time::Duration;

use desktop_updater::update::analytics::StatTags;
use desktop_updater::update::{
    AnalyticsEvent, AnalyticsRecord, AnalyticsReporter, PixelReporter, UpdateChannel,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn wait_for_requests(server: &MockServer, count: usize) {
    for _ in 0..100 {
        if server
            .received_requests()
            .await
            .is_some_and(|reqs| reqs.len() >= count)
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("mock server did not receive {count} request(s)");
}

#[tokio::test]
async fn no_update_bumps_update_check_stat() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b.gif"))
        .and(query_param("x_desktop-update-check", "osx-10-1-0-no-update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let reporter = PixelReporter::new(
        &format!("{}/b.gif", server.uri()),
        tokio::runtime::Handle::current(),
    )
    .unwrap();
    let tags = StatTags::new("desktop", "osx", "10.1.0", UpdateChannel::Stable);
    reporter
        .record(&AnalyticsRecord::build(AnalyticsEvent::NoUpdate, &tags))
        .unwrap();

    wait_for_requests(&server, 1).await;
}

#[tokio::test]
async fn download_sends_all_four_stats_in_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b.gif"))
        .and(query_param("x_desktop-download", "windows-app"))
        .and(query_param("x_desktop-download-by-ver", "windows-app-2-0-0"))
        .and(query_param("x_desktop-download-ref", "update-windows-app"))
        .and(query_param("x_desktop-download-ref-only", "update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let reporter = PixelReporter::new(
        &format!("{}/b.gif", server.uri()),
        tokio::runtime::Handle::current(),
    )
    .unwrap();
    let tags = StatTags::new("desktop", "windows", "2.0.0", UpdateChannel::Beta);
    reporter
        .record(&AnalyticsRecord::build(AnalyticsEvent::Downloaded, &tags))
        .unwrap();

    wait_for_requests(&server, 1).await;
}

#[tokio::test]
async fn server_errors_do_not_surface_to_caller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let reporter = PixelReporter::new(&server.uri(), tokio::runtime::Handle::current()).unwrap();
    let tags = StatTags::new("desktop", "linux", "1.0.0", UpdateChannel::Beta);
    let record = AnalyticsRecord::build(AnalyticsEvent::Error, &tags);

    assert!(reporter.record(&record).is_ok());
    wait_for_requests(&server, 1).await;
}
