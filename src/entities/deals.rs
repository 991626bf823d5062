//! `SeaORM` Entity for deals table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::DealStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub url: String,
    /// Current price
    #[sea_orm(column_type = "Decimal(Some((20, 8)))")]
    pub price: Decimal,
    /// Reference price before the discount; strictly above `price` when set
    #[sea_orm(column_type = "Decimal(Some((20, 8)))", nullable)]
    pub original_price: Option<Decimal>,
    pub currency: String,
    pub source: String,
    pub status: DealStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::price_histories::Entity")]
    PriceHistories,
    #[sea_orm(has_many = "super::price_trackers::Entity")]
    PriceTrackers,
}

impl Related<super::price_histories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceHistories.def()
    }
}

impl Related<super::price_trackers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceTrackers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
