use candlefold_domain::services::aggregator::aggregate;
use candlefold_domain::services::encoder::{decode, encode};
use candlefold_domain::value_objects::candle::AggregatedCandle;
use candlefold_domain::value_objects::price_record::PriceRecord;
use chrono::NaiveDate;
use proptest::prelude::*;

fn record(idx: usize, open: f64, spread: f64, close: f64, volume: u64) -> PriceRecord {
    let low = open.min(close) - spread;
    let high = open.max(close) + spread;
    PriceRecord {
        instrument: "BANKNIFTY".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        time: format!("t{idx}"),
        open,
        high,
        low,
        close,
        volume,
    }
}

fn records_strategy() -> impl Strategy<Value = Vec<PriceRecord>> {
    prop::collection::vec(
        (0.01f64..100_000.0, 0.0f64..50.0, 0.01f64..100_000.0, 0u64..1_000_000),
        1..120,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(idx, (open, spread, close, volume))| record(idx, open, spread, close, volume))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn candle_count_is_ceiling_of_len_over_bucket(records in records_strategy(), k in 1i64..25) {
        let candles = aggregate(&records, k).expect("aggregate");
        let k = k as usize;
        prop_assert_eq!(candles.len(), records.len().div_ceil(k));
    }

    #[test]
    fn each_candle_reduces_its_bucket(records in records_strategy(), k in 1i64..25) {
        let candles = aggregate(&records, k).expect("aggregate");
        for (candle, bucket) in candles.iter().zip(records.chunks(k as usize)) {
            let first = &bucket[0];
            let last = &bucket[bucket.len() - 1];
            prop_assert_eq!(candle.open, first.open);
            prop_assert_eq!(candle.close, last.close);
            prop_assert_eq!(&candle.time, &first.time);
            prop_assert_eq!(
                candle.volume,
                bucket.iter().map(|r| u128::from(r.volume)).sum::<u128>()
            );
            let high = bucket.iter().map(|r| r.high).fold(f64::MIN, f64::max);
            let low = bucket.iter().map(|r| r.low).fold(f64::MAX, f64::min);
            prop_assert_eq!(candle.high, high);
            prop_assert_eq!(candle.low, low);
        }
    }

    #[test]
    fn encoded_payload_decodes_to_same_candles(records in records_strategy(), k in 1i64..25) {
        let candles: Vec<AggregatedCandle> = aggregate(&records, k).expect("aggregate");
        let payload = encode(&candles).expect("encode");
        let decoded = decode(&payload).expect("decode");
        prop_assert_eq!(decoded, candles);
    }
}
