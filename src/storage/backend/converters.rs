use crate::storage::Link;
use migration::entities::link;

pub fn model_to_link(model: link::Model) -> Link {
    Link {
        short_code: model.short_code,
        destination: model.destination,
        token: model.token,
        created_at: model.created_at,
        visits: model.visits.max(0) as u64,
    }
}

/// 新记录的 ActiveModel，所有列都显式赋值
pub fn link_to_active_model(link: &Link) -> link::ActiveModel {
    use sea_orm::ActiveValue::Set;

    link::ActiveModel {
        short_code: Set(link.short_code.clone()),
        destination: Set(link.destination.clone()),
        token: Set(link.token.clone()),
        created_at: Set(link.created_at),
        visits: Set(link.visits.min(i64::MAX as u64) as i64),
    }
}
