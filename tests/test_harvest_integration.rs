//! End-to-end harvest runs against a mock owners endpoint
//!
//! Covers the full stack: HTTP transport with retry, contract filtering,
//! SQLite upserts in a temp directory, and the final report.

#[cfg(test)]
mod harvest_integration_tests {
    use holder_harvest::harvest::{ProgressEvent, ProgressObserver, RunReport, Termination};
    use holder_harvest::{CancellationFlag, HarvestConfig, Harvester, HolderStore, RetryingFetcher};
    use mockito::{Matcher, Server};
    use rusqlite::Connection;
    use serde_json::{json, Value};
    use std::io;
    use tempfile::tempdir;

    const OWNERS_PATH: &str = "/erc20/0xtoken/owners";
    const FIRST_QUERY: &str = "chain=bsc&limit=100&order=DESC";

    struct Silent;

    impl ProgressObserver for Silent {
        fn on_page(&mut self, _event: &ProgressEvent) -> io::Result<()> {
            Ok(())
        }
    }

    fn config_for(server: &Server) -> HarvestConfig {
        let url = server.url();
        HarvestConfig::from_lookup(move |key| match key {
            "MORALIS_API_KEY" => Some("test-key".to_string()),
            "MORALIS_API_URL" => Some(url.clone()),
            "HOLDERS_TOKEN_ADDRESS" => Some("0xtoken".to_string()),
            "HOLDERS_RETRY_LIMIT" => Some("3".to_string()),
            "HOLDERS_RETRY_DELAY_MS" => Some("1".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn holder(address: &str, balance_formatted: &str, is_contract: bool) -> Value {
        json!({
            "owner_address": address,
            "balance": format!("{}000000000000000000", balance_formatted),
            "balance_formatted": balance_formatted,
            "is_contract": is_contract
        })
    }

    async fn run_against(server: &Server, db_name: &str, prepare: impl FnOnce(&Connection)) -> (RunReport, Vec<String>) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join(db_name);
        let config = config_for(server);

        let store = HolderStore::open(&db_path).unwrap();
        store.initialize().unwrap();
        prepare(&Connection::open(&db_path).unwrap());

        let fetcher = RetryingFetcher::http(&config).unwrap();
        let mut harvester = Harvester::new(&config, fetcher, store, Silent, CancellationFlag::new());
        let report = harvester.run().await;
        assert!(harvester.store().is_closed());

        let conn = Connection::open(&db_path).unwrap();
        let mut stmt = conn
            .prepare("SELECT owner_address || ':' || balance_formatted FROM token_holders ORDER BY owner_address")
            .unwrap();
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        (report, rows)
    }

    #[tokio::test]
    async fn test_overwrite_across_pages() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(FIRST_QUERY.to_string()))
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_body(
                json!({
                    "cursor": "X",
                    "totalSupply": "1000",
                    "result": [holder("0xA", "10", false), holder("0xB", "50", true)]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(format!("{}&cursor=X", FIRST_QUERY)))
            .with_status(200)
            .with_body(json!({ "cursor": null, "result": [holder("0xA", "15", false)] }).to_string())
            .expect(1)
            .create_async()
            .await;

        let (report, rows) = run_against(&server, "scenario.db", |_| {}).await;

        first.assert_async().await;
        second.assert_async().await;
        assert!(matches!(report.termination, Termination::Done));
        assert_eq!(rows, vec!["0xA:15".to_string()]);

        let stats = report.stats.as_ref().unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.non_contract, 1);
        assert_eq!(stats.max_balance, Some(15.0));
        assert_eq!(report.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_poison_batch_does_not_stop_ingestion() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(FIRST_QUERY.to_string()))
            .with_status(200)
            .with_body(json!({ "cursor": "c1", "result": [holder("0xA", "3", false)] }).to_string())
            .create_async()
            .await;
        server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(format!("{}&cursor=c1", FIRST_QUERY)))
            .with_status(200)
            .with_body(
                json!({ "cursor": "c2", "result": [holder("0xC", "2", false), holder("0xBAD", "1", false)] })
                    .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(format!("{}&cursor=c2", FIRST_QUERY)))
            .with_status(200)
            .with_body(json!({ "result": [holder("0xD", "1", false)] }).to_string())
            .create_async()
            .await;

        let (report, rows) = run_against(&server, "poison.db", |conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_poison BEFORE INSERT ON token_holders
                 WHEN NEW.owner_address = '0xBAD'
                 BEGIN SELECT RAISE(ABORT, 'poison record'); END;",
            )
            .unwrap();
        })
        .await;

        assert!(matches!(report.termination, Termination::Done));
        assert_eq!(report.pages, 3);
        assert_eq!(report.total_fetched, 4);
        assert_eq!(report.total_saved, 2);
        assert_eq!(rows, vec!["0xA:3".to_string(), "0xD:1".to_string()]);
    }

    #[tokio::test]
    async fn test_null_fields_do_not_abort_run() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(FIRST_QUERY.to_string()))
            .with_status(200)
            .with_body(
                json!({
                    "cursor": "c1",
                    "result": [
                        holder("0xA", "10", false),
                        { "owner_address": "0xB", "balance": null, "balance_formatted": null, "is_contract": true }
                    ]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(format!("{}&cursor=c1", FIRST_QUERY)))
            .with_status(200)
            .with_body(json!({ "result": [holder("0xC", "2", false)] }).to_string())
            .create_async()
            .await;

        let (report, rows) = run_against(&server, "nulls.db", |_| {}).await;

        first.assert_async().await;
        assert!(matches!(report.termination, Termination::Done));
        assert_eq!(report.pages, 2);
        assert_eq!(rows, vec!["0xA:10".to_string(), "0xC:2".to_string()]);
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(FIRST_QUERY.to_string()))
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(FIRST_QUERY.to_string()))
            .with_status(200)
            .with_body(json!({ "result": [holder("0xA", "1", false)] }).to_string())
            .expect(1)
            .create_async()
            .await;

        let (report, rows) = run_against(&server, "limited.db", |_| {}).await;

        limited.assert_async().await;
        ok.assert_async().await;
        assert!(matches!(report.termination, Termination::Done));
        assert_eq!(rows, vec!["0xA:1".to_string()]);
    }

    #[tokio::test]
    async fn test_server_errors_abort_run() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(FIRST_QUERY.to_string()))
            .with_status(200)
            .with_body(json!({ "cursor": "c1", "result": [holder("0xA", "3", false)] }).to_string())
            .create_async()
            .await;
        let failing = server
            .mock("GET", OWNERS_PATH)
            .match_query(Matcher::Exact(format!("{}&cursor=c1", FIRST_QUERY)))
            .with_status(503)
            .expect(4)
            .create_async()
            .await;

        let (report, rows) = run_against(&server, "aborted.db", |_| {}).await;

        failing.assert_async().await;
        assert!(matches!(report.termination, Termination::Aborted(_)));
        assert_eq!(report.exit_code(), 1);
        assert_eq!(rows, vec!["0xA:3".to_string()]);
    }
}
