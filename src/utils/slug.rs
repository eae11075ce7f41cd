//! URL slug 生成

/// 生成 URL 友好的 slug
///
/// 转小写，去掉字母数字、空白、`-`、`_` 以外的字符，空白转为 `-`，
/// 合并连续的 `-` 并去掉首尾 `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = true;

    for ch in text.trim().to_lowercase().chars() {
        let mapped = if ch.is_alphanumeric() || ch == '_' {
            Some(ch)
        } else if ch.is_whitespace() || ch == '-' {
            Some('-')
        } else {
            None
        };

        match mapped {
            Some('-') if last_dash => {}
            Some('-') => {
                slug.push('-');
                last_dash = true;
            }
            Some(c) => {
                slug.push(c);
                last_dash = false;
            }
            None => {}
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// 在 base 后追加 `-n` 直到 `taken` 返回 false
pub fn unique_slug<F>(base: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = if base.is_empty() { "deal" } else { base };
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
