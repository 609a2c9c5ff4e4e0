use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status, spelled as the backend spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Delivered,
    #[serde(rename = "cancle")]
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancle",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub promotion_price: f64,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub link: String,
}

impl OrderItem {
    pub fn amount(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponOrder {
    pub discount_name: String,
    pub discount_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub order_id: String,
    pub user_infor: CustomerInfo,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_cost: f64,
    #[serde(default)]
    pub sub_total: f64,
    pub total: f64,
    #[serde(default)]
    pub discount_codes: Vec<CouponOrder>,
    pub status: OrderStatus,
    pub payment_method: String,
    #[serde(default, rename = "cancleContent")]
    pub cancel_content: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Body of a cancellation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderCancel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "cancleContent", skip_serializing_if = "Option::is_none")]
    pub cancel_content: Option<String>,
}
