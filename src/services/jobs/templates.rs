//! 机器人消息模板
//!
//! 占位符：`{title}` `{price}` `{discount}` `{shortDesc}` `{affiliateUrl}`，
//! 降价提醒额外支持 `{oldPrice}` `{newPrice}`。

use crate::storage::Deal;
use crate::utils::format_price;

pub const DIGEST_HEADER: &str = "📢 *Daily Deal Digest*\n\n";

pub const DEFAULT_NEW_DEAL_TEMPLATE: &str =
    "🔥 *New Deal Alert*\n\n*{title}*\n\n💰 *{price}* ({discount}% off)\n\n{shortDesc}\n\n{affiliateUrl}";

pub const DEFAULT_PRICE_DROP_TEMPLATE: &str =
    "🔔 *Price Drop Alert*\n\n*{title}*\n\n💰 *{oldPrice}* → *{newPrice}*\n\n{shortDesc}\n\n{affiliateUrl}";

const DIGEST_SEPARATOR: &str = "\n\n---\n\n";
const NO_PRICE: &str = "Check Price";
const NO_DISCOUNT: &str = "N/A";
const DEFAULT_CURRENCY: &str = "INR";

fn price_text(price: Option<f64>) -> String {
    match price {
        Some(p) if p > 0.0 => format_price(p, DEFAULT_CURRENCY),
        _ => NO_PRICE.to_string(),
    }
}

/// 转义 Telegram Markdown 的保留字符，只用于代入的值，模板自身的标记保持不变
pub fn escape_markdown(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn fill(template: &str, deal: &Deal, extra: &[(&str, String)]) -> String {
    let discount = deal
        .discount
        .filter(|d| *d > 0)
        .map(|d| d.to_string())
        .unwrap_or_else(|| NO_DISCOUNT.to_string());

    let mut text = template
        .replace("{title}", &escape_markdown(&deal.title))
        .replace("{price}", &price_text(deal.current_price))
        .replace("{discount}", &discount)
        .replace("{shortDesc}", &escape_markdown(&deal.short_desc))
        .replace("{affiliateUrl}", &escape_markdown(deal.outbound_url()));
    for (key, value) in extra {
        text = text.replace(key, value);
    }
    text
}

/// 新优惠提醒，template 为空时使用默认模板
pub fn render_new_deal(template: Option<&str>, deal: &Deal) -> String {
    fill(template.unwrap_or(DEFAULT_NEW_DEAL_TEMPLATE), deal, &[])
}

pub fn render_price_drop(
    template: Option<&str>,
    deal: &Deal,
    old_price: f64,
    new_price: f64,
) -> String {
    fill(
        template.unwrap_or(DEFAULT_PRICE_DROP_TEMPLATE),
        deal,
        &[
            ("{oldPrice}", price_text(Some(old_price))),
            ("{newPrice}", price_text(Some(new_price))),
        ],
    )
}

/// 汇总消息：固定标题 + 每个优惠一段
pub fn render_digest(template: Option<&str>, deals: &[Deal]) -> String {
    let body = deals
        .iter()
        .map(|deal| render_new_deal(template, deal))
        .collect::<Vec<_>>()
        .join(DIGEST_SEPARATOR);
    format!("{}{}", DIGEST_HEADER, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DealStatus;
    use chrono::Utc;

    fn deal(price: Option<f64>, discount: Option<i32>) -> Deal {
        Deal {
            id: "d1".into(),
            title: "Wireless Mouse".into(),
            slug: "wireless-mouse".into(),
            description: String::new(),
            short_desc: "Ergonomic".into(),
            current_price: price,
            original_price: None,
            discount,
            product_url: "https://shop.example/mouse".into(),
            affiliate_url: Some("https://aff.example/m".into()),
            coupon: None,
            image_url: None,
            status: DealStatus::Published,
            is_expired: false,
            category_id: None,
            clicks: 0,
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_new_deal_template() {
        let text = render_new_deal(None, &deal(Some(499.0), Some(50)));
        assert_eq!(
            text,
            "🔥 *New Deal Alert*\n\n*Wireless Mouse*\n\n💰 *₹499* (50% off)\n\nErgonomic\n\nhttps://aff.example/m"
        );
    }

    #[test]
    fn test_reserved_characters_in_values_are_escaped() {
        let mut d = deal(Some(499.0), Some(50));
        d.title = "Mega_Sale *50%*".into();
        d.short_desc = "Use [code] `SAVE`".into();
        d.affiliate_url = Some("https://aff.example/m?sub_id=1".into());

        let text = render_new_deal(None, &d);
        assert_eq!(
            text,
            "🔥 *New Deal Alert*\n\n*Mega\\_Sale \\*50%\\**\n\n💰 *₹499* (50% off)\n\n\
             Use \\[code] \\`SAVE\\`\n\nhttps://aff.example/m?sub\\_id=1"
        );
    }

    #[test]
    fn test_template_markup_is_left_alone() {
        assert_eq!(escape_markdown("Wireless Mouse"), "Wireless Mouse");
        let text = render_new_deal(Some("*{title}* _{shortDesc}_"), &deal(None, None));
        assert_eq!(text, "*Wireless Mouse* _Ergonomic_");
    }

    #[test]
    fn test_missing_price_and_discount() {
        let text = render_new_deal(Some("{price} / {discount}"), &deal(Some(0.0), None));
        assert_eq!(text, "Check Price / N/A");
    }

    #[test]
    fn test_price_drop_template() {
        let text = render_price_drop(Some("{oldPrice} -> {newPrice}"), &deal(None, None), 999.0, 749.5);
        assert_eq!(text, "₹999 -> ₹749.50");
    }

    #[test]
    fn test_digest_has_header_and_one_block_per_deal() {
        let deals = vec![deal(Some(1.0), None), deal(Some(2.0), None)];
        let text = render_digest(Some("*{title}*"), &deals);
        assert_eq!(
            text,
            "📢 *Daily Deal Digest*\n\n*Wireless Mouse*\n\n---\n\n*Wireless Mouse*"
        );
    }
}
