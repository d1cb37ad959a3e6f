//! 단일 종목 현재가 조회 (`quote` 명령).

use crate::Result;
use quote_core::{Quote, QuoteProvider, Symbol};

/// 종목 하나를 조회합니다. 시장 시간과 무관하게 실행됩니다.
pub async fn lookup_quote(provider: &dyn QuoteProvider, symbol: &Symbol) -> Result<Option<Quote>> {
    Ok(provider.fetch_quote(symbol).await?)
}

/// 사람이 읽을 수 있는 여러 줄 형식으로 변환합니다.
pub fn format_quote(quote: &Quote) -> String {
    format!(
        "{name}({code})\n  현재가: {price}원 ({diff:+}, {rate:+.2}%)\n  시가/고가/저가: {open} / {high} / {low}\n  거래량: {volume}주\n  거래대금: {value}원",
        name = quote.name,
        code = quote.code,
        price = group_digits(quote.current_price),
        diff = quote.price_diff,
        rate = quote.change_rate,
        open = group_digits(quote.open_price),
        high = group_digits(quote.high_price),
        low = group_digits(quote.low_price),
        volume = group_digits(quote.volume),
        value = group_digits(quote.trading_value),
    )
}

/// 세 자리마다 쉼표를 넣습니다.
fn group_digits(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
