use crate::data::ReturnSeries;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

//the two questions the signal pipeline asks of a securities master
pub trait SecuritiesMaster: Send + Sync {
    //whether the identifier denotes a cash/fx instrument
    fn is_cash(&self, id: &str) -> bool;

    //the equity index linked to an instrument, if any
    fn linked_index(&self, id: &str) -> Option<&str>;
}

//country-keyed instrument tables for one strategy run
//built once, never mutated while a pipeline is running
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    //country name -> currency pair id
    pub currencies: IndexMap<String, String>,

    //country name -> national equity index id
    #[serde(default)]
    pub indices: IndexMap<String, String>,
}

impl Universe {
    pub fn new(currencies: IndexMap<String, String>, indices: IndexMap<String, String>) -> Self {
        Universe {
            currencies,
            indices,
        }
    }

    //builds a universe from (name, id) pairs
    pub fn from_pairs(currencies: &[(&str, &str)], indices: &[(&str, &str)]) -> Self {
        let to_map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect::<IndexMap<_, _>>()
        };
        Universe::new(to_map(currencies), to_map(indices))
    }

    //keeps only currency pairs that are known cash instruments, indices untouched
    pub fn with_known_cash(&self, cash_ids: &BTreeSet<String>) -> Self {
        let currencies = self
            .currencies
            .iter()
            .filter(|(_, id)| cash_ids.contains(*id))
            .map(|(name, id)| (name.clone(), id.clone()))
            .collect();

        Universe::new(currencies, self.indices.clone())
    }

    //keeps only currency pairs that are known cash instruments,
    //then only indices whose country still has a currency pair
    pub fn filtered(&self, cash_ids: &BTreeSet<String>) -> Self {
        let known = self.with_known_cash(cash_ids);
        let indices = known
            .indices
            .iter()
            .filter(|(name, _)| known.currencies.contains_key(*name))
            .map(|(name, id)| (name.clone(), id.clone()))
            .collect();

        Universe::new(known.currencies, indices)
    }

    pub fn currency_ids(&self) -> impl Iterator<Item = &str> {
        self.currencies.values().map(String::as_str)
    }

    pub fn index_ids(&self) -> impl Iterator<Item = &str> {
        self.indices.values().map(String::as_str)
    }

    //index id -> currency pair id for every country that has both
    pub fn index_to_currency(&self) -> HashMap<String, String> {
        self.indices
            .iter()
            .filter_map(|(name, index_id)| {
                self.currencies
                    .get(name)
                    .map(|fx_id| (index_id.clone(), fx_id.clone()))
            })
            .collect()
    }

    //whether the currency pair belongs to a country that also has an index
    pub fn currency_has_index(&self, fx_id: &str) -> bool {
        self.currencies
            .iter()
            .any(|(name, id)| id == fx_id && self.indices.contains_key(name))
    }

    //countries with an index return on the last row, sorted by ascending return
    pub fn latest_ranking(&self, index_returns: &ReturnSeries) -> Vec<(String, f64)> {
        let Some(last) = index_returns.len().checked_sub(1) else {
            return Vec::new();
        };

        let mut ranking: Vec<(String, f64)> = self
            .indices
            .iter()
            .filter_map(|(name, id)| index_returns.value(last, id).map(|r| (name.clone(), r)))
            .collect();

        ranking.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranking
    }
}

impl SecuritiesMaster for Universe {
    fn is_cash(&self, id: &str) -> bool {
        self.currencies.values().any(|fx_id| fx_id == id)
    }

    fn linked_index(&self, id: &str) -> Option<&str> {
        let name = self
            .currencies
            .iter()
            .find(|(_, fx_id)| fx_id.as_str() == id)
            .map(|(name, _)| name)?;
        self.indices.get(name).map(String::as_str)
    }
}

//usd crosses traded by the currency strategies
pub const CURRENCY_PAIRS: &[(&str, &str)] = &[
    ("australia", "FXAUDUSD"),
    ("china", "FXUSDCNH"),
    ("newzealand", "FXNZDUSD"),
    ("norway", "FXUSDNOK"),
    ("canada", "FXUSDCAD"),
    ("japan", "FXUSDJPY"),
    ("thailand", "FXUSDTHB"),
    ("swiss", "FXUSDCHF"),
    ("turkey", "FXUSDTRY"),
    ("poland", "FXUSDPLN"),
    ("singapore", "FXUSDSGD"),
    ("czech", "FXUSDCZK"),
    ("denmark", "FXUSDDKK"),
    ("hungary", "FXUSDHUF"),
    ("eu", "FXEURUSD"),
    ("england", "FXGBPUSD"),
    ("mexico", "FXUSDMXN"),
    ("hongkong", "FXUSDHKD"),
    ("sweden", "FXUSDSEK"),
    ("southafrica", "FXUSDZAR"),
];

//usd-denominated national index etfs paired with the currency flow strategy
//hungary and sweden have no usd listing, hong kong is pegged
pub const FLOW_INDICES: &[(&str, &str)] = &[
    ("china", "FIBBG006H1RJZ6"),
    ("canada", "FIBBG000QW7RC0"),
    ("japan", "FIBBG009S0XQY8"),
    ("mexico", "FIBBG0015XN496"),
    ("poland", "FIBBG001DQBCC3"),
    ("thailand", "FIBBG0017DVJR6"),
    ("newzealand", "FIBBG0015M9W30"),
];

//broader index set ranked by the top-n index strategy
pub const WORLD_INDICES: &[(&str, &str)] = &[
    ("china", "FIBBG00203J8V6"),
    ("canada", "FIBBG0029T2KJ5"),
    ("japan", "FIBBG000BL97R6"),
    ("mexico", "FIBBG0015XN496"),
    ("hungary", "FIBBG000QGWGG7"),
    ("sweden", "FIBBG000QZXB02"),
    ("poland", "FIBBG001CGQZG5"),
    ("korea", "FIBBG000PQY818"),
    ("thailand", "FIBBG0017DVJR6"),
    ("newzealand", "FIBBG001CGQZJ2"),
    ("hongkong", "FIBBG007V5QTW1"),
];

//s&p 500 tracker used as the trend benchmark
pub const SNP500: &str = "FIBBG000BDTBL9";
