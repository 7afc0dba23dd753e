use proptest::prelude::*;

use txforge_primitives::codec::{Reader, VarInt, Writer};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn varint_roundtrip(value in any::<u64>()) {
        let encoded = VarInt(value).to_bytes();
        prop_assert_eq!(encoded.len(), VarInt(value).length());
        let mut reader = Reader::new(&encoded);
        prop_assert_eq!(reader.read_varint().unwrap(), VarInt(value));
        prop_assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn integer_roundtrip(a in any::<u16>(), b in any::<u32>(), c in any::<u64>()) {
        let mut writer = Writer::new();
        writer.write_u16_le(a);
        writer.write_u32_le(b);
        writer.write_u64_le(c);
        let data = writer.into_bytes();
        let mut reader = Reader::new(&data);
        prop_assert_eq!(reader.read_u16_le().unwrap(), a);
        prop_assert_eq!(reader.read_u32_le().unwrap(), b);
        prop_assert_eq!(reader.read_u64_le().unwrap(), c);
    }

    #[test]
    fn reverse_read_is_involutive(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut reader = Reader::new(&bytes);
        let mut reversed = reader.read_bytes_reverse(bytes.len()).unwrap();
        reversed.reverse();
        prop_assert_eq!(reversed, bytes);
    }
}
