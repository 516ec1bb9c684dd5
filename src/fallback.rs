//! Built-in keyword tables consulted when no user rule matches.
//!
//! Each statement format has its own ordered table; the first entry whose
//! keywords are all present (case-insensitively) wins.

use crate::models::{Classification, RawRecord, StatementFormat, TxnType};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Description,
    MerchantCategory,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Direction {
    Credit,
    Debit,
}

#[derive(Debug)]
pub struct FallbackEntry {
    field: Field,
    direction: Direction,
    keywords: &'static [&'static str],
    txn_type: TxnType,
    category: &'static str,
}

const fn debit(keywords: &'static [&'static str], category: &'static str) -> FallbackEntry {
    FallbackEntry {
        field: Field::Description,
        direction: Direction::Debit,
        keywords,
        txn_type: TxnType::Expenses,
        category,
    }
}

const fn credit(keywords: &'static [&'static str], category: &'static str) -> FallbackEntry {
    FallbackEntry {
        field: Field::Description,
        direction: Direction::Credit,
        keywords,
        txn_type: TxnType::Income,
        category,
    }
}

const fn sector(keyword: &'static [&'static str], category: &'static str) -> FallbackEntry {
    FallbackEntry {
        field: Field::MerchantCategory,
        direction: Direction::Debit,
        keywords: keyword,
        txn_type: TxnType::Expenses,
        category,
    }
}

const BANK_TABLE: &[FallbackEntry] = &[
    credit(&["webloyalty sarl", "salaire"], "Employment"),
    credit(&["credit ubs twint"], "Extras / Twint Chargeback"),
    credit(&["etat de vaud"], "Side Hustle"),
    credit(&["civil et mil"], "Side Hustle"),
    credit(&["loyer"], "Side Hustle"),
    debit(&["sbb"], "Train"),
    debit(&["pilet + renaud"], "Housing"),
    debit(&["assura"], "Health Insurance"),
    debit(&["swisscom"], "Internet + Mobile"),
    debit(&["coop pronto", "tankstelle"], "Car"),
    debit(&["coop pronto", "gasoline"], "Car"),
    debit(&["coop"], "Groceries"),
    debit(&["migros"], "Groceries"),
    debit(&["services industriels"], "Home Utils"),
    debit(&["bancomat"], "Withdraw"),
    debit(&["withdrawal"], "Withdraw"),
    debit(&["balance closing"], "CC fees"),
    debit(&["service prices"], "CC fees"),
    debit(&["debit ubs twint"], "Extras"),
];

/// Merchant-category (sector) codes as printed on card invoices.
const CARD_TABLE: &[FallbackEntry] = &[
    sector(&["grocery stores"], "Groceries"),
    sector(&["fast-food restaurants"], "Restaurants"),
    sector(&["fast food restaurant"], "Restaurants"),
    sector(&["restaurants"], "Restaurants"),
    sector(&["bakeries"], "Restaurants"),
    sector(&["gasoline service stations"], "Car"),
    sector(&["pharmacies"], "Health Other"),
    sector(&["digital goods"], "Digital Goods"),
    sector(&["computer software stores"], "Digital Goods"),
    sector(&["department stores"], "Extras"),
    sector(&["electronics stores"], "Digital Goods"),
    sector(&["book stores"], "Extras"),
    sector(&["barber or beauty shops"], "Wellbeing"),
    sector(&["recreation services"], "Sport"),
    sector(&["taxicabs"], "Restaurants"),
    sector(&["package stores"], "Extras"),
    sector(&["retail business"], "Extras"),
    // Interest charges carry no sector.
    debit(&["interets"], "CC fees"),
    debit(&["interest"], "CC fees"),
];

pub fn table(format: StatementFormat) -> &'static [FallbackEntry] {
    match format {
        StatementFormat::BankStatement => BANK_TABLE,
        StatementFormat::CardInvoice => CARD_TABLE,
    }
}

impl FallbackEntry {
    fn matches(&self, record: &RawRecord, description: &str, merchant: &str) -> bool {
        let direction_ok = match self.direction {
            Direction::Credit => record.amount > 0,
            Direction::Debit => record.amount < 0,
        };
        let haystack = match self.field {
            Field::Description => description,
            Field::MerchantCategory => merchant,
        };
        direction_ok && !haystack.is_empty() && self.keywords.iter().all(|k| haystack.contains(k))
    }
}

pub fn lookup(record: &RawRecord) -> Option<Classification> {
    let description = record.description.to_lowercase();
    let merchant = record
        .merchant_category
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    table(record.source)
        .iter()
        .find(|entry| entry.matches(record, &description, &merchant))
        .map(|entry| Classification {
            txn_type: entry.txn_type,
            category: entry.category.to_string(),
            sub_type: None,
        })
}
