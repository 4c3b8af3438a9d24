//! BLS12-381 signature verification with explicit pairings.
//!
//! Keys are compressed G1 points, signatures compressed G2 points (min-pk).
//! Verification checks the bilinear identity
//!
//! ```text
//! e(G1, sig) == e(pk, H(msg))
//! ```
//!
//! computing each side as its own Miller loop plus final exponentiation, so
//! that a degenerate result on either side can be reported on its own.
//! Structural problems (bad encodings, points outside the prime-order
//! subgroups, pairing outputs outside GT) are errors; a clean mismatch is
//! `Ok(false)`.

use blst::min_pk::{PublicKey, Signature};
use blst::{
    blst_fp12, blst_hash_to_g2, blst_p1_affine, blst_p1_affine_generator, blst_p2,
    blst_p2_affine, blst_p2_to_affine, BLST_ERROR,
};
use fairchain_crypto::SIGNATURE_DST;
use fairchain_types::{BlsPublicKey, BlsSignature};

use crate::error::VerifyError;

/// Verify `signature` over `message` under `public_key` with the protocol DST.
pub fn verify(
    signature: &BlsSignature,
    message: &[u8],
    public_key: &BlsPublicKey,
) -> Result<bool, VerifyError> {
    verify_with_dst(signature, message, public_key, SIGNATURE_DST)
}

/// Verify with an explicit domain separation tag.
///
/// Only useful for interop checks; the round protocol always goes through
/// [`verify`].
pub fn verify_with_dst(
    signature: &BlsSignature,
    message: &[u8],
    public_key: &BlsPublicKey,
    dst: &[u8],
) -> Result<bool, VerifyError> {
    let sig = decode_signature(signature)?;
    let pk = decode_public_key(public_key)?;
    let (generator, hashed) = curve_inputs(message, dst);

    let lhs = blst_fp12::miller_loop(<&blst_p2_affine>::from(&sig), &generator).final_exp();
    let rhs = blst_fp12::miller_loop(&hashed, <&blst_p1_affine>::from(&pk)).final_exp();

    let matched = compare_pairings(&lhs, &rhs)?;
    if !matched {
        tracing::debug!(public_key = %public_key, "signature does not match message");
    }
    Ok(matched)
}

fn compare_pairings(lhs: &blst_fp12, rhs: &blst_fp12) -> Result<bool, VerifyError> {
    if !lhs.in_group() {
        return Err(VerifyError::InvalidPairingResult(
            "e(G1, signature) is not in GT; check the signature",
        ));
    }
    if !rhs.in_group() {
        return Err(VerifyError::InvalidPairingResult(
            "e(public key, H(message)) is not in GT; check the public key and message",
        ));
    }
    Ok(lhs == rhs)
}

fn decode_signature(signature: &BlsSignature) -> Result<Signature, VerifyError> {
    let sig = Signature::uncompress(signature.as_bytes())
        .map_err(|err| VerifyError::MalformedSignature(point_reason(err, "G2")))?;
    sig.validate(false)
        .map_err(|err| VerifyError::MalformedSignature(point_reason(err, "G2")))?;
    Ok(sig)
}

fn decode_public_key(public_key: &BlsPublicKey) -> Result<PublicKey, VerifyError> {
    let pk = PublicKey::uncompress(public_key.as_bytes())
        .map_err(|err| VerifyError::MalformedPublicKey(point_reason(err, "G1")))?;
    pk.validate()
        .map_err(|err| VerifyError::MalformedPublicKey(point_reason(err, "G1")))?;
    Ok(pk)
}

fn point_reason(err: BLST_ERROR, group: &str) -> String {
    match err {
        BLST_ERROR::BLST_POINT_NOT_ON_CURVE => "point is not on the curve".into(),
        BLST_ERROR::BLST_POINT_NOT_IN_GROUP => format!("point is not in the {group} subgroup"),
        BLST_ERROR::BLST_PK_IS_INFINITY => "point is the identity".into(),
        BLST_ERROR::BLST_BAD_ENCODING => "bad compressed encoding".into(),
        other => format!("{group} decompression: {other:?}"),
    }
}

/// The G1 generator and `H(message)` in G2.
///
/// Neither has a safe wrapper in blst.
fn curve_inputs(message: &[u8], dst: &[u8]) -> (blst_p1_affine, blst_p2_affine) {
    let mut projective = blst_p2::default();
    let mut hashed = blst_p2_affine::default();
    // SAFETY: blst_p1_affine_generator returns a pointer to a static that
    // lives for the whole program. The hash call reads `message` and `dst`
    // through pointer/length pairs taken from live slices and passes no
    // augmentation. Both out-pointers reference locals of this frame.
    let generator = unsafe {
        blst_hash_to_g2(
            &mut projective,
            message.as_ptr(),
            message.len(),
            dst.as_ptr(),
            dst.len(),
            std::ptr::null(),
            0,
        );
        blst_p2_to_affine(&mut hashed, &projective);
        *blst_p1_affine_generator()
    };
    (generator, hashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairchain_crypto::{keypair_from_ikm, sign_message};

    fn signed(message: &[u8]) -> (BlsSignature, BlsPublicKey) {
        let kp = keypair_from_ikm(&[0x5a; 32]).unwrap();
        (sign_message(message, &kp.secret).unwrap(), kp.public)
    }

    #[test]
    fn valid_signature_verifies() {
        let (sig, pk) = signed(b"test");
        assert_eq!(verify(&sig, b"test", &pk), Ok(true));
    }

    #[test]
    fn wrong_message_is_mismatch_not_error() {
        let (sig, pk) = signed(b"test");
        assert_eq!(verify(&sig, b"tesu", &pk), Ok(false));
    }

    #[test]
    fn wrong_key_is_mismatch() {
        let (sig, _) = signed(b"test");
        let other = keypair_from_ikm(&[0x11; 32]).unwrap();
        assert_eq!(verify(&sig, b"test", &other.public), Ok(false));
    }

    #[test]
    fn dst_mismatch_fails_silently() {
        let (sig, pk) = signed(b"test");
        assert_eq!(
            verify_with_dst(&sig, b"test", &pk, b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_"),
            Ok(false)
        );
    }

    #[test]
    fn flipped_last_signature_byte_never_verifies() {
        let (sig, pk) = signed(b"test");
        let mut bytes = *sig.as_bytes();
        bytes[95] ^= 0x01;
        let tampered = BlsSignature::new(bytes);
        assert!(!matches!(verify(&tampered, b"test", &pk), Ok(true)));
    }

    #[test]
    fn garbage_signature_is_malformed() {
        let (_, pk) = signed(b"test");
        let garbage = BlsSignature::new([0xff; 96]);
        assert!(matches!(
            verify(&garbage, b"test", &pk),
            Err(VerifyError::MalformedSignature(_))
        ));
    }

    #[test]
    fn uncompressed_flag_missing_is_malformed() {
        let (sig, pk) = signed(b"test");
        let mut bytes = *sig.as_bytes();
        bytes[0] &= 0x7f;
        assert!(matches!(
            verify(&BlsSignature::new(bytes), b"test", &pk),
            Err(VerifyError::MalformedSignature(_))
        ));
    }

    #[test]
    fn garbage_public_key_is_malformed() {
        let (sig, _) = signed(b"test");
        let garbage = BlsPublicKey::new([0xff; 48]);
        assert!(matches!(
            verify(&sig, b"test", &garbage),
            Err(VerifyError::MalformedPublicKey(_))
        ));
    }

    #[test]
    fn identity_public_key_is_malformed() {
        let (sig, _) = signed(b"test");
        let mut bytes = [0u8; 48];
        bytes[0] = 0xc0;
        assert!(matches!(
            verify(&sig, b"test", &BlsPublicKey::new(bytes)),
            Err(VerifyError::MalformedPublicKey(_))
        ));
    }

    #[test]
    fn empty_message_round_trips() {
        let (sig, pk) = signed(b"");
        assert_eq!(verify(&sig, b"", &pk), Ok(true));
    }

    #[test]
    fn agrees_with_blst_high_level_api() {
        let (sig, pk) = signed(b"cross-check");
        let hl_pk = PublicKey::from_bytes(pk.as_bytes()).unwrap();
        let hl_sig = Signature::from_bytes(sig.as_bytes()).unwrap();
        let expected =
            hl_sig.verify(true, b"cross-check", SIGNATURE_DST, &[], &hl_pk, true)
                == BLST_ERROR::BLST_SUCCESS;
        assert!(expected);
        assert_eq!(verify(&sig, b"cross-check", &pk), Ok(expected));
    }

    // Ciphersuite BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_ vectors from the
    // Filecoin `bls-signatures` test data; messages are the UTF-8 bytes.
    const EMPTY_MSG_PK: &str = "b2be11dc8e54ee74dbc07569fd74fe03b5f52ad71cd49a8579b6c6387891f5a20ad980ec2747618c1b9ad35846a68a3e";
    const EMPTY_MSG_SIG: &str = "b53cfdf8b488a286df1ed20432e2bbc4e6361003757dfda3a4fd6cd98de95e5513f7c448d70b2681e14547a6ced47e7c10e28432e8abcb34de1dc28f39328fd2a13db12a4c6a30bd17b0e42881a429003e4c24583ba0f29a40fd836cf05e1a40";
    const DIGITS_MSG_PK: &str = "981de2d88a80a2d7752ecda66443340a789ea62dd68dca6a3a8caf3b6c1e94248a8819a4f6ba554f50f5ccb8bc40e67c";
    const DIGITS_MSG_SIG: &str = "84aa59cad078a34c3c1f876e924ee199cd8cf74857cebcad3037561964cfda50dce5f4d0709aa690dae7113b01a9c8c31557f5589c38eb720e86864ff0c4446fba21899d4cd0b2862ec395de1dfdb736bf38ca56d17019b257c5d4dd563bf5b7";

    fn vector(pk: &str, sig: &str) -> (BlsSignature, BlsPublicKey) {
        (
            BlsSignature::from_hex(sig).unwrap(),
            BlsPublicKey::from_hex(pk).unwrap(),
        )
    }

    fn with_last_byte(sig: &BlsSignature, byte: u8) -> BlsSignature {
        let mut bytes = *sig.as_bytes();
        bytes[95] = byte;
        BlsSignature::new(bytes)
    }

    /// Compressed G1 encoding of the point with x coordinate `x`.
    fn g1_with_x(x: u8) -> BlsPublicKey {
        let mut bytes = [0u8; 48];
        bytes[0] = 0x80;
        bytes[47] = x;
        BlsPublicKey::new(bytes)
    }

    /// Compressed G2 encoding of the point with x coordinate `x + 0i`.
    fn g2_with_x(x: u8) -> BlsSignature {
        let mut bytes = [0u8; 96];
        bytes[0] = 0x80;
        bytes[95] = x;
        BlsSignature::new(bytes)
    }

    #[test]
    fn known_vector_empty_message() {
        let (sig, pk) = vector(EMPTY_MSG_PK, EMPTY_MSG_SIG);
        assert_eq!(verify(&sig, b"", &pk), Ok(true));
        assert_eq!(verify(&sig, b"\0", &pk), Ok(false));
    }

    #[test]
    fn known_vector_digits_message() {
        let (sig, pk) = vector(DIGITS_MSG_PK, DIGITS_MSG_SIG);
        assert_eq!(verify(&sig, b"1234", &pk), Ok(true));
        assert_eq!(verify(&sig, b"1235", &pk), Ok(false));

        let (_, other_pk) = vector(EMPTY_MSG_PK, EMPTY_MSG_SIG);
        assert_eq!(verify(&sig, b"1234", &other_pk), Ok(false));
    }

    #[test]
    fn known_vector_with_flipped_last_byte_is_rejected() {
        // x lands off the curve
        let (sig, pk) = vector(DIGITS_MSG_PK, DIGITS_MSG_SIG);
        let tampered = with_last_byte(&sig, sig.as_bytes()[95] ^ 0x01);
        assert_eq!(
            verify(&tampered, b"1234", &pk),
            Err(VerifyError::MalformedSignature("point is not on the curve".into()))
        );

        // x lands on the curve but outside the prime-order subgroup
        let (sig, pk) = vector(EMPTY_MSG_PK, EMPTY_MSG_SIG);
        let tampered = with_last_byte(&sig, sig.as_bytes()[95] ^ 0x01);
        assert_eq!(
            verify(&tampered, b"", &pk),
            Err(VerifyError::MalformedSignature(
                "point is not in the G2 subgroup".into()
            ))
        );
    }

    #[test]
    fn g2_point_off_curve_is_malformed() {
        let (_, pk) = signed(b"test");
        assert_eq!(
            verify(&g2_with_x(1), b"test", &pk),
            Err(VerifyError::MalformedSignature("point is not on the curve".into()))
        );
    }

    #[test]
    fn g2_point_outside_subgroup_is_malformed() {
        let (_, pk) = signed(b"test");
        assert_eq!(
            verify(&g2_with_x(2), b"test", &pk),
            Err(VerifyError::MalformedSignature(
                "point is not in the G2 subgroup".into()
            ))
        );
    }

    #[test]
    fn g1_point_off_curve_is_malformed() {
        let (sig, _) = signed(b"test");
        assert_eq!(
            verify(&sig, b"test", &g1_with_x(1)),
            Err(VerifyError::MalformedPublicKey("point is not on the curve".into()))
        );
    }

    #[test]
    fn g1_point_outside_subgroup_is_malformed() {
        let (sig, _) = signed(b"test");
        assert_eq!(
            verify(&sig, b"test", &g1_with_x(4)),
            Err(VerifyError::MalformedPublicKey(
                "point is not in the G1 subgroup".into()
            ))
        );
    }

    #[test]
    fn every_last_byte_of_a_signature_is_classified() {
        let (sig, pk) = signed(b"test");
        let original = sig.as_bytes()[95];
        let (mut off_curve, mut outside_group) = (0, 0);

        for byte in (0..=255u8).filter(|b| *b != original) {
            let candidate = with_last_byte(&sig, byte);
            let expected = match Signature::uncompress(candidate.as_bytes()) {
                Err(BLST_ERROR::BLST_POINT_NOT_ON_CURVE) => {
                    off_curve += 1;
                    "point is not on the curve"
                }
                Ok(point) => {
                    assert!(point.validate(false).is_err(), "byte {byte:#04x}");
                    outside_group += 1;
                    "point is not in the G2 subgroup"
                }
                Err(other) => panic!("unexpected {other:?} for byte {byte:#04x}"),
            };
            assert_eq!(
                verify(&candidate, b"test", &pk),
                Err(VerifyError::MalformedSignature(expected.into())),
                "byte {byte:#04x}"
            );
        }
        assert!(off_curve > 0 && outside_group > 0);
    }

    #[test]
    fn every_last_byte_of_a_public_key_is_classified() {
        let (sig, pk) = signed(b"test");
        let original = pk.as_bytes()[47];
        let (mut off_curve, mut outside_group) = (0, 0);

        for byte in (0..=255u8).filter(|b| *b != original) {
            let mut bytes = *pk.as_bytes();
            bytes[47] = byte;
            let candidate = BlsPublicKey::new(bytes);
            let expected = match PublicKey::uncompress(candidate.as_bytes()) {
                Err(BLST_ERROR::BLST_POINT_NOT_ON_CURVE) => {
                    off_curve += 1;
                    "point is not on the curve"
                }
                Ok(point) => {
                    assert!(point.validate().is_err(), "byte {byte:#04x}");
                    outside_group += 1;
                    "point is not in the G1 subgroup"
                }
                Err(other) => panic!("unexpected {other:?} for byte {byte:#04x}"),
            };
            assert_eq!(
                verify(&sig, b"test", &candidate),
                Err(VerifyError::MalformedPublicKey(expected.into())),
                "byte {byte:#04x}"
            );
        }
        assert!(off_curve > 0 && outside_group > 0);
    }

    #[test]
    fn pairing_outside_gt_is_reported_per_side() {
        let (sig, pk) = signed(b"test");
        let sig = decode_signature(&sig).unwrap();
        let pk = decode_public_key(&pk).unwrap();
        let (generator, hashed) = curve_inputs(b"test", SIGNATURE_DST);

        // a Miller loop without the final exponentiation is not in GT
        let raw = blst_fp12::miller_loop(<&blst_p2_affine>::from(&sig), &generator);
        let good = blst_fp12::miller_loop(&hashed, <&blst_p1_affine>::from(&pk)).final_exp();
        assert!(!raw.in_group());

        assert!(matches!(
            compare_pairings(&raw, &good),
            Err(VerifyError::InvalidPairingResult(reason)) if reason.contains("e(G1, signature)")
        ));
        assert!(matches!(
            compare_pairings(&good, &raw),
            Err(VerifyError::InvalidPairingResult(reason)) if reason.contains("e(public key")
        ));
        assert_eq!(compare_pairings(&good, &good), Ok(true));
    }
}
