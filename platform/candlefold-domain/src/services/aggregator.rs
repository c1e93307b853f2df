use crate::errors::DomainError;
use crate::value_objects::bucket_size::BucketSize;
use crate::value_objects::candle::AggregatedCandle;
use crate::value_objects::price_record::PriceRecord;

/// Folds consecutive runs of `bucket_size` records into one candle each.
///
/// Buckets are purely positional: the caller guarantees `records` arrive in
/// chronological order and belong to one instrument. The last bucket holds the
/// remainder and may be shorter.
pub fn aggregate(
    records: &[PriceRecord],
    bucket_size: i64,
) -> Result<Vec<AggregatedCandle>, DomainError> {
    let bucket_size = BucketSize::new(bucket_size)?;
    Ok(aggregate_with(records, bucket_size))
}

pub fn aggregate_with(records: &[PriceRecord], bucket_size: BucketSize) -> Vec<AggregatedCandle> {
    records
        .chunks(bucket_size.get())
        .filter_map(reduce_bucket)
        .collect()
}

pub fn reduce_bucket(bucket: &[PriceRecord]) -> Option<AggregatedCandle> {
    let (first, rest) = bucket.split_first()?;
    let mut candle = AggregatedCandle::open_with(first);
    for record in rest {
        candle.absorb(record);
    }
    Some(candle)
}

/// Counts buckets whose members carry more than one instrument. Aggregation
/// does not reject these; callers decide whether to warn or refuse.
pub fn mixed_instrument_buckets(records: &[PriceRecord], bucket_size: BucketSize) -> usize {
    records
        .chunks(bucket_size.get())
        .filter(|bucket| match bucket.split_first() {
            Some((first, rest)) => rest.iter().any(|r| r.instrument != first.instrument),
            None => false,
        })
        .count()
}
