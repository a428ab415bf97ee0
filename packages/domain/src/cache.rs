//! # レスポンスキャッシュのキー設計
//!
//! BFF は上流 API のレスポンスを TTL 付きでキャッシュする。
//! このモジュールはキャッシュの「どこに・どれだけの期間」置くかを決める値オブジェクトを定義する。
//!
//! ## キー形式
//!
//! | スコープ | 形式 |
//! |---------|------|
//! | 公開 | `{namespace}:public:{query}` |
//! | テナント | `{namespace}:{tenant または -}:{fingerprint}:{query}` |
//!
//! テナントスコープのキーには呼び出し元の資格情報（Cookie / Authorization）の
//! フィンガープリントを含める。上流で拒否されるはずの呼び出し元に、
//! 別ユーザーのキャッシュを返さないためである。
//!
//! ## 無効化
//!
//! 更新系リクエストの成功後、`{namespace}:{tenant}:*` のパターンで
//! テナント配下のキーをまとめて削除する。同じ呼び出し元がテナントを付けずに
//! 読んだ結果も古くなるため、`{namespace}:-:*` も一緒に消す。
//! テナントが不明な場合は `{namespace}:*`。

use std::{fmt, time::Duration};

use derive_more::Display;
use sha2::{Digest, Sha256};
use url::form_urlencoded;

use crate::tenant::{TenantId, UNKNOWN_TENANT_MARKER};

// --- TTL ---

/// キャッシュの有効期間
///
/// ルートごとのデータ更新頻度に合わせてプリセットから選ぶ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTtl {
    /// 30 秒（メッセージ一覧など頻繁に変わるもの）
    VeryShort,
    /// 2 分
    Short,
    /// 5 分
    Medium,
    /// 10 分
    Long,
    /// 30 分
    VeryLong,
    /// 60 分（プラン一覧など滅多に変わらないもの）
    Hour,
    /// 任意の期間
    Custom(Duration),
}

impl CacheTtl {
    pub fn as_duration(&self) -> Duration {
        match self {
            Self::VeryShort => Duration::from_secs(30),
            Self::Short => Duration::from_secs(2 * 60),
            Self::Medium => Duration::from_secs(5 * 60),
            Self::Long => Duration::from_secs(10 * 60),
            Self::VeryLong => Duration::from_secs(30 * 60),
            Self::Hour => Duration::from_secs(60 * 60),
            Self::Custom(duration) => *duration,
        }
    }

    /// 秒単位の TTL
    ///
    /// Redis の `SETEX` は 1 秒未満を受け付けないため、端数は切り上げて最低 1 を返す。
    pub fn as_secs(&self) -> u64 {
        let duration = self.as_duration();
        let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
        secs.max(1)
    }
}

// --- 名前空間 ---

/// キャッシュキーの名前空間（ルートファミリー単位の接頭辞）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct CacheNamespace(&'static str);

impl CacheNamespace {
    pub const STUDENTS_LIST: Self = Self("students:list");
    pub const STAFF_LIST: Self = Self("staff:list");
    pub const BATCHES_LIST: Self = Self("batches:list");
    pub const ATTENDANCE: Self = Self("attendance");
    pub const ACCOUNTS_OVERVIEW: Self = Self("accounts:overview");
    pub const ACCOUNTS_FEES_PENDING: Self = Self("accounts:fees-pending");
    pub const EXPENSES_LIST: Self = Self("expenses:list");
    pub const RECEIPTS_LIST: Self = Self("receipts:list");
    pub const DASHBOARD_HOME: Self = Self("dashboard:home");
    pub const WHATSAPP_STATS: Self = Self("whatsapp:stats");
    pub const WHATSAPP_TEMPLATES: Self = Self("whatsapp:templates");
    pub const WHATSAPP_CONTACTS: Self = Self("whatsapp:contacts");
    pub const WHATSAPP_MESSAGES: Self = Self("whatsapp:messages");
    pub const SOCIAL_INSIGHTS: Self = Self("social:insights");
    pub const EXAMS_LIST: Self = Self("exams:list");
    pub const EXAMS_STATS: Self = Self("exams:stats");
    pub const EXAMS_REGISTRATIONS: Self = Self("exams:registrations");
    pub const PUBLIC_EXAMS: Self = Self("public:exams");
    pub const PUBLIC_RESULTS: Self = Self("public:results");
    pub const PLANS_PUBLIC: Self = Self("plans:public");
    pub const TENANTS_LIST: Self = Self("tenants:list");
    pub const SETTINGS_PROFILE: Self = Self("settings:profile");
    pub const SETTINGS_SIDEBAR: Self = Self("settings:sidebar");
    pub const USERS_LIST: Self = Self("users:list");
    pub const TESTS_LIST: Self = Self("tests:list");
    pub const STUDENT_TESTS: Self = Self("tests:student");
    pub const RECEIPTS_SEARCH: Self = Self("receipts:search");
    pub const DEMO_REQUESTS: Self = Self("demo-requests:list");
    pub const EMPLOYEES_LIST: Self = Self("employees:list");
    pub const SETTINGS_STAFF_LIST: Self = Self("settings:staff-list");
    pub const SOCIAL_CAMPAIGNS: Self = Self("social:campaigns");
    pub const SOCIAL_DASHBOARD: Self = Self("social:dashboard");
    pub const SOCIAL_PAGES: Self = Self("social:pages");
    pub const SOCIAL_STATUS: Self = Self("social:status");
    pub const PLANS_ALL: Self = Self("plans:all");
    pub const WHATSAPP_CONVERSATIONS: Self = Self("whatsapp:conversations");

    /// 任意の名前空間を作る（テスト用途や将来のルート追加用）
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// キャッシュの共有範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    /// 全呼び出し元で共有する（公開試験情報、プラン一覧）
    Public,
    /// テナントと資格情報ごとに分離する
    Tenant,
}

// --- 資格情報フィンガープリント ---

/// 転送される資格情報から導出する短いハッシュ
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct CredentialFingerprint(String);

impl CredentialFingerprint {
    const ANONYMOUS: &'static str = "anon";
    const HEX_LEN: usize = 16;

    /// Cookie と Authorization の値から SHA-256 の先頭 16 桁を計算する
    ///
    /// どちらも空なら `anon` を返す。
    pub fn from_credentials(cookie: Option<&str>, authorization: Option<&str>) -> Self {
        let cookie = cookie.unwrap_or_default();
        let authorization = authorization.unwrap_or_default();

        if cookie.is_empty() && authorization.is_empty() {
            return Self(Self::ANONYMOUS.to_string());
        }

        let mut hasher = Sha256::new();
        hasher.update(cookie.as_bytes());
        hasher.update(b"\n");
        hasher.update(authorization.as_bytes());
        let digest = hex::encode(hasher.finalize());

        Self(digest[..Self::HEX_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// --- クエリパラメータ ---

/// キャッシュバスター用のクエリパラメータ名
pub const CACHE_BUSTER_PARAM: &str = "_ts";

/// パース済みのクエリ文字列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// `a=1&b=2` 形式の生クエリをパースする
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|raw| {
                form_urlencoded::parse(raw.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    /// 指定した名前の最初の空でない値を返す
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .find(|v| !v.is_empty())
    }

    /// パラメータを追加する
    ///
    /// パスパラメータをキャッシュキーに含めるために使う。
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.pairs.push((name.to_string(), value.to_string()));
        self
    }

    /// `_ts` が付いているか（キャッシュを読まずに再取得する合図）
    pub fn has_cache_buster(&self) -> bool {
        self.pairs.iter().any(|(k, _)| k == CACHE_BUSTER_PARAM)
    }

    /// キャッシュキー用の正規化表現
    ///
    /// キー、値の順にソートし、`_ts` を除外して URL エンコードする。
    pub fn normalized(&self) -> String {
        let mut pairs: Vec<&(String, String)> = self
            .pairs
            .iter()
            .filter(|(k, _)| k != CACHE_BUSTER_PARAM)
            .collect();
        pairs.sort();

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in pairs {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}

// --- キャッシュキー ---

/// キャッシュエントリのキー
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct CacheKey(String);

impl CacheKey {
    /// 全呼び出し元で共有するキー
    pub fn public(namespace: CacheNamespace, query: &QueryParams) -> Self {
        Self(format!("{}:public:{}", namespace, query.normalized()))
    }

    /// テナントと資格情報で分離するキー
    pub fn tenant(
        namespace: CacheNamespace,
        tenant_id: Option<&TenantId>,
        fingerprint: &CredentialFingerprint,
        query: &QueryParams,
    ) -> Self {
        let tenant = tenant_id.map_or(UNKNOWN_TENANT_MARKER, TenantId::as_str);
        Self(format!(
            "{}:{}:{}:{}",
            namespace,
            tenant,
            fingerprint,
            query.normalized()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// --- 無効化パターン ---

/// `*` のみをワイルドカードとするグロブパターン
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern(String);

impl KeyPattern {
    /// テナント配下の全キー: `{namespace}:{tenant}:*`
    pub fn tenant(namespace: CacheNamespace, tenant_id: &TenantId) -> Self {
        Self(format!("{}:{}:*", namespace, tenant_id))
    }

    /// テナント不明で保存されたキー: `{namespace}:-:*`
    pub fn unscoped(namespace: CacheNamespace) -> Self {
        Self(format!("{}:{}:*", namespace, UNKNOWN_TENANT_MARKER))
    }

    /// 名前空間全体: `{namespace}:*`
    pub fn namespace(namespace: CacheNamespace) -> Self {
        Self(format!("{}:*", namespace))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// キーがパターンに一致するか（先頭から末尾までの完全一致）
    pub fn matches(&self, key: &str) -> bool {
        let mut segments = self.0.split('*');
        let Some(first) = segments.next() else {
            return key.is_empty();
        };
        let Some(mut rest) = key.strip_prefix(first) else {
            return false;
        };

        let segments: Vec<&str> = segments.collect();
        let Some((last, middle)) = segments.split_last() else {
            // ワイルドカードなし
            return rest.is_empty();
        };

        for segment in middle {
            match rest.find(segment) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }

        rest.len() >= last.len() && rest.ends_with(last)
    }
}

impl fmt::Debug for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyPattern").field(&self.0).finish()
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
