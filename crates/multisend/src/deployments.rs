//! Canonical multiSend deployment addresses per contract version.
//!
//! When the exact version has no deployment on a chain, lookup falls back to
//! the newest older version that does. Classification of batched recovery
//! calls depends on this table: a batch is only benign if it targets a
//! canonical deployment.

use safekit_types::{Address, SafeVersion};

struct Deployment {
    version: SafeVersion,
    address: Address,
    /// Chains the deployment is known on; `None` means every chain.
    chains: Option<&'static [u64]>,
}

const fn addr(bytes: [u8; 20]) -> Address {
    Address(bytes)
}

/// Canonical deployments, newest first.
static DEPLOYMENTS: &[Deployment] = &[
    Deployment {
        version: SafeVersion::new(1, 4, 1),
        address: addr([
            0x38, 0x86, 0x9b, 0xf6, 0x6a, 0x61, 0xcF, 0x6b, 0xDB, 0x99, 0x6A, 0x6a, 0xE4, 0x0D,
            0x58, 0x53, 0xFd, 0x43, 0xB5, 0x26,
        ]),
        // 1.4.1 has not been rolled out everywhere
        chains: Some(&[1, 5, 10, 100, 137, 8453, 42161, 11155111]),
    },
    Deployment {
        version: SafeVersion::new(1, 3, 0),
        address: addr([
            0xA2, 0x38, 0xCB, 0xeb, 0x14, 0x2c, 0x10, 0xEf, 0x7A, 0xd8, 0x44, 0x2C, 0x6D, 0x1f,
            0x9E, 0x89, 0xe0, 0x7e, 0x77, 0x61,
        ]),
        chains: None,
    },
    Deployment {
        version: SafeVersion::new(1, 1, 1),
        address: addr([
            0x8D, 0x29, 0xbE, 0x29, 0x92, 0x3b, 0x68, 0xab, 0xfD, 0xD2, 0x1e, 0x54, 0x1b, 0x93,
            0x74, 0x73, 0x7B, 0x49, 0xcd, 0xAD,
        ]),
        chains: None,
    },
];

/// Canonical multiSend address for a Safe version on a chain, falling back
/// to the newest older deployment available there.
pub fn multisend_address(version: SafeVersion, chain_id: u64) -> Option<Address> {
    DEPLOYMENTS
        .iter()
        .filter(|d| d.version <= version)
        .find(|d| match d.chains {
            None => true,
            Some(chains) => chains.contains(&chain_id),
        })
        .map(|d| d.address)
}

/// `true` when `address` is any canonical multiSend deployment usable for
/// the version/chain pair.
pub fn is_canonical_multisend(address: &Address, version: SafeVersion, chain_id: u64) -> bool {
    DEPLOYMENTS
        .iter()
        .filter(|d| d.version <= version)
        .filter(|d| match d.chains {
            None => true,
            Some(chains) => chains.contains(&chain_id),
        })
        .any(|d| d.address == *address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_version_wins() {
        let got = multisend_address(SafeVersion::new(1, 4, 1), 1).unwrap();
        assert_eq!(
            got.to_string(),
            "0x38869bf66a61cf6bdb996a6ae40d5853fd43b526"
        );
    }

    #[test]
    fn falls_back_to_older_deployment_on_missing_chain() {
        // 1.4.1 is not listed for this chain id, so 1.3.0 must be used
        let got = multisend_address(SafeVersion::new(1, 4, 1), 424242).unwrap();
        assert_eq!(
            got.to_string(),
            "0xa238cbeb142c10ef7ad8442c6d1f9e89e07e7761"
        );
    }

    #[test]
    fn old_account_never_gets_newer_deployment() {
        let got = multisend_address(SafeVersion::new(1, 1, 1), 1).unwrap();
        assert_eq!(
            got.to_string(),
            "0x8d29be29923b68abfdd21e541b9374737b49cdad"
        );
    }

    #[test]
    fn canonical_check_accepts_fallback_versions() {
        let legacy: Address = "0xa238cbeb142c10ef7ad8442c6d1f9e89e07e7761"
            .parse()
            .unwrap();
        assert!(is_canonical_multisend(&legacy, SafeVersion::new(1, 4, 1), 1));
        assert!(!is_canonical_multisend(
            &Address([0x99; 20]),
            SafeVersion::new(1, 4, 1),
            1
        ));
    }
}
