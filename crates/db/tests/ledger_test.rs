//! Integration tests for the SQLite transfer ledger.

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use token_ledger_db::{DbPool, LedgerStore, SqliteLedger, StoreError, TransferRecord};

    const ALICE: &str = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";
    const BOB: &str = "0xab5801a7d398351b8be11c439e05c5b3259aec9b";
    const CAROL: &str = "0x1db3439a222c519ab44bb1144fc28167b4fa6ee6";

    async fn ledger() -> SqliteLedger {
        let db = DbPool::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        SqliteLedger::new(db)
    }

    fn transfer(hash: &str, from: &str, to: &str, block: u64) -> TransferRecord {
        TransferRecord::new(hash, from, to, "1000000000000000000", block, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let ledger = ledger().await;
        let record = transfer("0x01", ALICE, BOB, 10);

        assert!(ledger.put(&record).await.unwrap());
        assert!(!ledger.put(&record).await.unwrap());

        let page = ledger.query(ALICE, 1, 10).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_does_not_modify_existing() {
        let ledger = ledger().await;
        let original = transfer("0x01", ALICE, BOB, 10);
        ledger.put(&original).await.unwrap();

        let mut replay = transfer("0x01", CAROL, CAROL, 99);
        replay.amount = "1".to_string();
        assert!(!ledger.put(&replay).await.unwrap());

        let page = ledger.query(ALICE, 1, 10).await.unwrap();
        assert_eq!(page.records[0].amount, original.amount);
        assert_eq!(page.records[0].block_number, 10);
        assert_eq!(ledger.query(CAROL, 1, 10).await.unwrap().total_count, 0);
        assert_eq!(ledger.highest_block().await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_highest_block() {
        let ledger = ledger().await;
        assert_eq!(ledger.highest_block().await.unwrap(), None);

        for (hash, block) in [("0x01", 5), ("0x02", 1_250), ("0x03", 300)] {
            ledger.put(&transfer(hash, ALICE, BOB, block)).await.unwrap();
        }
        assert_eq!(ledger.highest_block().await.unwrap(), Some(1_250));
    }

    #[tokio::test]
    async fn test_negative_stored_block_is_an_error() {
        let ledger = ledger().await;
        let mut record = transfer("0x01", ALICE, BOB, 1);
        record.block_number = -1;
        ledger.put(&record).await.unwrap();

        assert!(matches!(
            ledger.highest_block().await,
            Err(StoreError::InvalidStoredBlock(-1))
        ));
    }

    #[tokio::test]
    async fn test_addresses_stored_lowercase_and_query_any_case() {
        let ledger = ledger().await;
        let mut record = transfer("0x01", ALICE, BOB, 1);
        // Bypass the constructor to check the store normalizes on its own.
        record.from = "0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string();
        record.to = BOB.to_uppercase().replacen("0X", "0x", 1);
        ledger.put(&record).await.unwrap();

        for variant in [
            ALICE.to_string(),
            ALICE.to_uppercase(),
            "0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string(),
        ] {
            let page = ledger.query(&variant, 1, 10).await.unwrap();
            assert_eq!(page.total_count, 1, "variant {variant}");
            assert_eq!(page.records[0].from, ALICE);
            assert_eq!(page.records[0].to, BOB);
        }
    }

    #[tokio::test]
    async fn test_query_matches_sender_or_recipient() {
        let ledger = ledger().await;
        ledger.put(&transfer("0x01", ALICE, BOB, 1)).await.unwrap();
        ledger.put(&transfer("0x02", BOB, ALICE, 2)).await.unwrap();
        ledger.put(&transfer("0x03", BOB, CAROL, 3)).await.unwrap();

        assert_eq!(ledger.query(ALICE, 1, 10).await.unwrap().total_count, 2);
        assert_eq!(ledger.query(BOB, 1, 10).await.unwrap().total_count, 3);
        assert_eq!(ledger.query(CAROL, 1, 10).await.unwrap().total_count, 1);
    }

    #[tokio::test]
    async fn test_query_orders_newest_first_and_paginates() {
        let ledger = ledger().await;
        for block in 1..=15u64 {
            let hash = format!("0x{block:02x}");
            ledger.put(&transfer(&hash, ALICE, BOB, block)).await.unwrap();
        }

        let first = ledger.query(ALICE, 1, 10).await.unwrap();
        assert_eq!(first.total_count, 15);
        let blocks: Vec<i64> = first.records.iter().map(|r| r.block_number).collect();
        assert_eq!(blocks, (6..=15).rev().collect::<Vec<_>>());

        let second = ledger.query(ALICE, 2, 10).await.unwrap();
        assert_eq!(second.total_count, 15);
        let blocks: Vec<i64> = second.records.iter().map(|r| r.block_number).collect();
        assert_eq!(blocks, vec![5, 4, 3, 2, 1]);

        let past_end = ledger.query(ALICE, 3, 10).await.unwrap();
        assert!(past_end.records.is_empty());
        assert_eq!(past_end.total_count, 15);
    }

    #[tokio::test]
    async fn test_query_treats_page_zero_as_first() {
        let ledger = ledger().await;
        ledger.put(&transfer("0x01", ALICE, BOB, 1)).await.unwrap();

        let page = ledger.query(ALICE, 0, 10).await.unwrap();
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_pool_reports_unavailable() {
        let db = DbPool::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let ledger = SqliteLedger::new(db.clone());
        db.close().await;

        let err = ledger.put(&transfer("0x01", ALICE, BOB, 1)).await.unwrap_err();
        assert!(matches!(err, token_ledger_db::StoreError::Unavailable(_)));
        assert!(ledger.highest_block().await.is_err());
    }
}
