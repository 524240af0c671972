//! Common regex patterns for packing-list labels.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Long digit run, not part of a longer one (SSCC carton codes, tracking IDs)
    pub static ref IDENTIFIER_RUN: Regex = Regex::new(
        r"(?:^|[^0-9])([0-9]{18,20})(?:[^0-9]|$)"
    ).unwrap();

    // Purchase order number
    pub static ref PO_NUMBER: Regex = Regex::new(
        r"(?i)\bP\.?O\.?\s*(?:#|No\.?|Number|:)\s*:?\s*([A-Za-z0-9][A-Za-z0-9\-/]*)"
    ).unwrap();

    // Amazon standard identification number
    pub static ref ASIN: Regex = Regex::new(
        r"(?i)\bASIN\s*#?\s*:?\s*([A-Z0-9]{10})\b"
    ).unwrap();

    pub static ref SKU: Regex = Regex::new(
        r"(?i)\b(?:SKU|Item\s+No\.?)\s*#?\s*:?\s*([A-Za-z0-9][A-Za-z0-9\-_./]*)"
    ).unwrap();

    pub static ref QUANTITY: Regex = Regex::new(
        r"(?i)\b(?:QTY|Quantity|Units)\s*:?\s*(\d+)"
    ).unwrap();

    pub static ref VENDOR: Regex = Regex::new(
        r"(?im)\b(?:Vendor|Supplier)\s*:?\s*([^\r\n]+)$"
    ).unwrap();

    pub static ref SHIP_DATE: Regex = Regex::new(
        r"(?i)\bShip\s*(?:Date|By)\s*:?\s*(\d{1,4}[./\-]\d{1,2}[./\-]\d{1,4})"
    ).unwrap();

    pub static ref SHIPMENT_ID: Regex = Regex::new(
        r"(?i)\bShipment\s*(?:ID|#)\s*:?\s*([A-Za-z0-9]+)"
    ).unwrap();

    pub static ref TOTAL_UNITS: Regex = Regex::new(
        r"(?i)\bTotal\s+(?:Units|Qty|Quantity)\s*:?\s*(\d+)"
    ).unwrap();

    pub static ref CARTON_COUNT: Regex = Regex::new(
        r"(?i)\bCarton\s+(\d+)\s+of\s+(\d+)"
    ).unwrap();
}
