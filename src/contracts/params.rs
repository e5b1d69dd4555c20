//! Parameter objects for the factory and template calls
//!
//! Plain values marshalled into the positional argument arrays the
//! contracts expect. Unset optional addresses become the zero address.

use alloy_primitives::{Address, Bytes, U256};
use rand::seq::SliceRandom;
use rand::Rng;

use super::abi;
use crate::error::Result;
use crate::units::{self, to_wei};

pub use abi::{ConsumeMarketFee, ProviderFee};

// ============================================
// NAMES
// ============================================

const ADJECTIVES: &[&str] = &[
    "adamant", "adroit", "amatory", "animistic", "antic", "arcadian", "baleful",
    "bellicose", "bilious", "boorish", "calamitous", "caustic", "cerulean",
    "comely", "concomitant", "contumacious", "corpulent", "crapulous",
    "defamatory", "didactic", "dilatory", "dowdy", "efficacious", "effulgent",
    "egregious", "endemic", "equanimous", "execrable", "fastidious", "feckless",
    "fecund", "friable", "fulsome", "garrulous", "guileless", "gustatory",
    "heuristic", "histrionic", "hubristic", "incendiary", "insidious",
    "insolent", "intransigent", "inveterate", "invidious", "irksome", "jejune",
    "jocular", "judicious", "lachrymose", "limpid", "loquacious", "luminous",
    "mannered", "mendacious", "meretricious", "minatory", "mordant", "munificent",
    "nefarious", "noxious", "obtuse", "parsimonious", "pendulous", "pernicious",
    "pervasive", "petulant", "platitudinous", "precipitate", "propitious",
    "puckish", "querulous", "quiescent", "rebarbative", "recalcitrant",
    "redolent", "rhadamanthine", "risible", "ruminative", "sagacious",
    "salubrious", "sartorial", "sclerotic", "serpentine", "spasmodic",
    "strident", "taciturn", "tenacious", "tremulous", "trenchant", "turbulent",
    "turgid", "ubiquitous", "uxorious", "verdant", "voluble", "voracious",
    "wheedling", "withering", "zealous",
];

const NOUNS: &[&str] = &[
    "ninja", "chair", "pancake", "statue", "unicorn", "rainbows", "laser",
    "senor", "bunny", "captain", "nibblets", "cupcake", "carrot", "gnomes",
    "glitter", "potato", "salad", "toejam", "curtains", "beets", "toilet",
    "exorcism", "stick figures", "mermaid eggs", "sea barnacles", "dragons",
    "jellybeans", "snakes", "dolls", "bushes", "cookies", "apples", "ice cream",
    "ukulele", "kazoo", "banjo", "opera singer", "circus", "trampoline",
    "carousel", "carnival", "locomotive", "hot air balloon", "praying mantis",
    "animator", "artisan", "artist", "colorist", "inker", "coppersmith",
    "director", "designer", "flatter", "stylist", "leadman", "limner",
    "make-up artist", "model", "musician", "penciller", "producer", "scenographer",
    "set decorator", "silversmith", "tutor", "auto mechanic", "beader",
    "bobbin boy", "clerk of the chapel", "filling station attendant", "foreman",
    "maintenance engineering", "mechanic", "miller", "moldmaker", "panel beater",
    "patternmaker", "plant operator", "plumber", "sawfiler", "shop foreman",
    "soaper", "stationary engineer", "wheelwright", "woodworkers",
];

/// A random readable datatoken/NFT name and a matching ticker
///
/// `generate_dt_name()` -> `("Sagacious Mermaid Eggs Token", "SAGMER-42")`
pub fn generate_dt_name() -> (String, String) {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("luminous");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("datatoken");

    let name = format!("{} {} Token", title_case(adjective), title_case(noun));
    let ticker = format!(
        "{}{}-{}",
        prefix(adjective),
        prefix(noun),
        rng.gen_range(0..100)
    );
    (name, ticker)
}

fn fill_names(name: Option<&str>, symbol: Option<&str>) -> (String, String) {
    match (name, symbol) {
        (Some(name), Some(symbol)) => (name.to_string(), symbol.to_string()),
        (name, symbol) => {
            let (generated_name, generated_symbol) = generate_dt_name();
            (
                name.map_or(generated_name, str::to_string),
                symbol.map_or(generated_symbol, str::to_string),
            )
        }
    }
}

fn title_case(words: &str) -> String {
    words
        .split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn prefix(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

// ============================================
// NFT CREATION
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub struct NftCreateParams {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub template_index: u64,
    pub token_uri: String,
    pub transferable: bool,
    pub owner: Address,
}

impl NftCreateParams {
    pub fn new(owner: Address) -> Self {
        Self {
            name: None,
            symbol: None,
            template_index: 1,
            token_uri: "https://oceanprotocol.com/nft/".to_string(),
            transferable: true,
            owner,
        }
    }

    /// Name and symbol, generating whichever is missing
    pub fn resolved_names(&self) -> (String, String) {
        fill_names(self.name.as_deref(), self.symbol.as_deref())
    }

    pub fn to_abi(&self) -> abi::NftCreateData {
        let (name, symbol) = self.resolved_names();
        abi::NftCreateData {
            name,
            symbol,
            templateIndex: U256::from(self.template_index),
            tokenURI: self.token_uri.clone(),
            transferable: self.transferable,
            owner: self.owner,
        }
    }
}

// ============================================
// DATATOKEN CREATION
// ============================================

pub const TEMPLATE_ACCESS_CONTROLLED: u64 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct DatatokenCreateParams {
    pub template_index: u64,
    pub minter: Address,
    pub payment_collector: Address,
    pub mp_fee_address: Address,
    pub fee_token: Address,
    /// Publishing market fee, in units of `fee_token`
    pub fee_amount: String,
    /// Human-readable cap (18 decimals)
    pub cap: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    /// Template 4: encrypted file object stored on the datatoken
    pub file_object: Option<Bytes>,
    /// Template 4: allow-list contract
    pub access_list: Option<Address>,
    /// Template 4: deny-list contract
    pub deny_list: Option<Address>,
}

impl DatatokenCreateParams {
    pub fn new(minter: Address) -> Self {
        Self {
            template_index: 1,
            minter,
            payment_collector: minter,
            mp_fee_address: Address::ZERO,
            fee_token: Address::ZERO,
            fee_amount: "0".to_string(),
            cap: "10000".to_string(),
            name: None,
            symbol: None,
            file_object: None,
            access_list: None,
            deny_list: None,
        }
    }

    pub fn resolved_names(&self) -> (String, String) {
        fill_names(self.name.as_deref(), self.symbol.as_deref())
    }

    /// Positional arrays for `createERC20`
    pub fn to_abi(&self, fee_token_decimals: u8) -> Result<abi::ErcCreateData> {
        let (name, symbol) = self.resolved_names();

        let mut addresses = vec![
            self.minter,
            self.payment_collector,
            self.mp_fee_address,
            self.fee_token,
        ];
        let mut bytess = Vec::new();
        if self.template_index == TEMPLATE_ACCESS_CONTROLLED {
            addresses.push(self.access_list.unwrap_or(Address::ZERO));
            addresses.push(self.deny_list.unwrap_or(Address::ZERO));
            if let Some(file_object) = &self.file_object {
                bytess.push(file_object.clone());
            }
        }

        Ok(abi::ErcCreateData {
            templateIndex: U256::from(self.template_index),
            strings: vec![name, symbol],
            addresses,
            uints: vec![
                to_wei(&self.cap)?,
                units::amount_to_units(&self.fee_amount, fee_token_decimals)?,
            ],
            bytess,
        })
    }
}

// ============================================
// PRICING
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub struct FreCreationParams {
    pub fixed_rate_address: Address,
    pub base_token_address: Address,
    pub owner: Address,
    pub market_fee_collector: Address,
    pub base_token_decimals: u8,
    pub datatoken_decimals: u8,
    /// Base tokens per datatoken
    pub fixed_rate: String,
    /// Fraction of the swap, e.g. "0.001"
    pub market_fee: String,
    pub allowed_consumer: Option<Address>,
    pub with_mint: bool,
}

impl FreCreationParams {
    pub fn addresses(&self) -> Vec<Address> {
        vec![
            self.base_token_address,
            self.owner,
            self.market_fee_collector,
            self.allowed_consumer.unwrap_or(Address::ZERO),
        ]
    }

    pub fn uints(&self) -> Result<Vec<U256>> {
        Ok(vec![
            U256::from(self.base_token_decimals),
            U256::from(self.datatoken_decimals),
            to_wei(&self.fixed_rate)?,
            to_wei(&self.market_fee)?,
            U256::from(u8::from(self.with_mint)),
        ])
    }

    pub fn to_abi(&self) -> Result<abi::FixedData> {
        Ok(abi::FixedData {
            fixedPriceAddress: self.fixed_rate_address,
            addresses: self.addresses(),
            uints: self.uints()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispenserParams {
    pub dispenser_address: Address,
    pub max_tokens: String,
    pub max_balance: String,
    pub with_mint: bool,
    pub allowed_swapper: Option<Address>,
}

impl DispenserParams {
    pub fn new(dispenser_address: Address) -> Self {
        Self {
            dispenser_address,
            max_tokens: "1".to_string(),
            max_balance: "1".to_string(),
            with_mint: true,
            allowed_swapper: None,
        }
    }

    pub fn to_abi(&self) -> Result<abi::DispenserData> {
        Ok(abi::DispenserData {
            dispenserAddress: self.dispenser_address,
            maxTokens: to_wei(&self.max_tokens)?,
            maxBalance: to_wei(&self.max_balance)?,
            withMint: self.with_mint,
            allowedSwapper: self.allowed_swapper.unwrap_or(Address::ZERO),
        })
    }
}

/// Fee charged by the publishing market on every order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishingMarketFee {
    pub fee_address: Address,
    pub fee_token: Address,
    pub fee_amount: U256,
}

// ============================================
// ORDERS
// ============================================

/// One entry of a batched `startMultipleTokenOrder`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOrderParams {
    pub token_address: Address,
    pub consumer: Address,
    pub service_index: u64,
    pub provider_fee: ProviderFee,
    pub consume_market_fee: Option<ConsumeMarketFee>,
}

impl TokenOrderParams {
    pub fn to_abi(&self) -> abi::TokenOrder {
        abi::TokenOrder {
            tokenAddress: self.token_address,
            consumer: self.consumer,
            serviceIndex: U256::from(self.service_index),
            providerFee: self.provider_fee.clone(),
            consumeMarketFee: self.consume_market_fee.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names() {
        for _ in 0..20 {
            let (name, symbol) = generate_dt_name();
            assert!(name.ends_with(" Token"));
            let (letters, number) = symbol.split_once('-').unwrap();
            assert_eq!(letters.len(), 6, "{symbol}");
            assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
            assert!(number.parse::<u32>().unwrap() < 100);
        }
    }

    #[test]
    fn test_nft_defaults() {
        let params = NftCreateParams::new(Address::with_last_byte(1));
        let data = params.to_abi();
        assert_eq!(data.templateIndex, U256::from(1));
        assert!(!data.name.is_empty() && !data.symbol.is_empty());

        let named = NftCreateParams {
            name: Some("Data NFT".into()),
            symbol: Some("DNFT".into()),
            ..params
        };
        assert_eq!(named.resolved_names(), ("Data NFT".to_string(), "DNFT".to_string()));
    }

    #[test]
    fn test_partial_names_keep_supplied_half() {
        let only_name = NftCreateParams {
            name: Some("Data NFT".into()),
            ..NftCreateParams::new(Address::with_last_byte(1))
        };
        let (name, symbol) = only_name.resolved_names();
        assert_eq!(name, "Data NFT");
        assert!(symbol.contains('-'));

        let only_symbol = DatatokenCreateParams {
            symbol: Some("DT1".into()),
            ..DatatokenCreateParams::new(Address::with_last_byte(1))
        };
        let (name, symbol) = only_symbol.resolved_names();
        assert!(name.ends_with(" Token"));
        assert_eq!(symbol, "DT1");
    }

    #[test]
    fn test_datatoken_arrays() {
        let params = DatatokenCreateParams {
            name: Some("DT".into()),
            symbol: Some("DT1".into()),
            fee_amount: "1.5".into(),
            ..DatatokenCreateParams::new(Address::with_last_byte(1))
        };
        let data = params.to_abi(6).unwrap();
        assert_eq!(data.strings, vec!["DT".to_string(), "DT1".to_string()]);
        assert_eq!(data.addresses.len(), 4);
        assert_eq!(data.uints[0], to_wei("10000").unwrap());
        assert_eq!(data.uints[1], U256::from(1_500_000u64));
        assert!(data.bytess.is_empty());
    }

    #[test]
    fn test_access_controlled_template_wires_lists() {
        let params = DatatokenCreateParams {
            template_index: TEMPLATE_ACCESS_CONTROLLED,
            access_list: Some(Address::with_last_byte(7)),
            file_object: Some(Bytes::from_static(b"files")),
            ..DatatokenCreateParams::new(Address::with_last_byte(1))
        };
        let data = params.to_abi(18).unwrap();
        assert_eq!(data.addresses[4], Address::with_last_byte(7));
        assert_eq!(data.addresses[5], Address::ZERO);
        assert_eq!(data.bytess, vec![Bytes::from_static(b"files")]);
    }

    #[test]
    fn test_fre_uints() {
        let params = FreCreationParams {
            fixed_rate_address: Address::with_last_byte(2),
            base_token_address: Address::with_last_byte(3),
            owner: Address::with_last_byte(1),
            market_fee_collector: Address::with_last_byte(1),
            base_token_decimals: 18,
            datatoken_decimals: 18,
            fixed_rate: "1".into(),
            market_fee: "0.001".into(),
            allowed_consumer: None,
            with_mint: true,
        };
        let uints = params.uints().unwrap();
        assert_eq!(uints[2], to_wei("1").unwrap());
        assert_eq!(uints[3], U256::from(1_000_000_000_000_000u64));
        assert_eq!(uints[4], U256::from(1));
        assert_eq!(params.addresses()[3], Address::ZERO);
    }
}
