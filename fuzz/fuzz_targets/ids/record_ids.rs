#![no_main]
use lendgraph::ids::{
    get_account_vtoken_id, get_reward_speed_id, get_transaction_id, Address,
};
use lendgraph::ingest_chain::EventOrdinal;
use libfuzzer_sys::fuzz_target;
use primitive_types::H256;

#[derive(Debug)]
struct Args {
    hashes: ([u8; 32], [u8; 32]),
    ordinals: (EventOrdinal, EventOrdinal),
    pairs: (([u8; 20], [u8; 20]), ([u8; 20], [u8; 20])),
}

impl arbitrary::Arbitrary<'_> for Args {
    fn arbitrary(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Self> {
        Ok(Args {
            hashes: <([u8; 32], [u8; 32])>::arbitrary(u)?,
            ordinals: <(EventOrdinal, EventOrdinal)>::arbitrary(u)?,
            pairs: arbitrary::Arbitrary::arbitrary(u)?,
        })
    }
}

fuzz_target!(|data: Args| {
    let (hash_a, hash_b) = (H256(data.hashes.0), H256(data.hashes.1));
    let (log_a, log_b) = (data.ordinals.0.log_index, data.ordinals.1.log_index);
    let same_log = hash_a == hash_b && log_a == log_b;
    assert_eq!(
        get_transaction_id(&hash_a, log_a) == get_transaction_id(&hash_b, log_b),
        same_log
    );

    let ((market_a, account_a), (market_b, account_b)) = data.pairs;
    let (market_a, account_a) = (Address::from(market_a), Address::from(account_a));
    let (market_b, account_b) = (Address::from(market_b), Address::from(account_b));
    let same_pair = market_a == market_b && account_a == account_b;
    assert_eq!(
        get_account_vtoken_id(&market_a, &account_a) == get_account_vtoken_id(&market_b, &account_b),
        same_pair
    );
    assert_eq!(
        get_reward_speed_id(&market_a, &account_a) == get_reward_speed_id(&market_b, &account_b),
        same_pair
    );
});
