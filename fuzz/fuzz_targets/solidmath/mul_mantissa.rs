#![no_main]
use lendgraph::solidmath::fixed_point::{to_big_int, MANTISSA_ONE};
use lendgraph::solidmath::full_math;
use lendgraph::solidmath::U256;
use libfuzzer_sys::fuzz_target;

#[derive(Debug)]
struct Args {
    amount: U256,
    mantissa: U256,
}

impl arbitrary::Arbitrary<'_> for Args {
    fn arbitrary(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Self> {
        Ok(Args {
            amount: U256(<[u64; 4]>::arbitrary(u)?),
            mantissa: U256(<[u64; 4]>::arbitrary(u)?),
        })
    }
}

// exact big integer arithmetic is the reference
fuzz_target!(|data: Args| {
    let expected = to_big_int(data.amount).unwrap() * to_big_int(data.mantissa).unwrap()
        / to_big_int(*MANTISSA_ONE).unwrap();
    match full_math::mul_mantissa(data.amount, data.mantissa) {
        Ok(product) => assert_eq!(to_big_int(product).unwrap(), expected),
        Err(_) => assert!(expected > to_big_int(U256::MAX).unwrap()),
    }
});
