//! Static directory corpora used across harnesses.

use orgbook_core::{GroupRecord, Member};

/// A group export as the admin portal produces it: BOM, CRLF, quoted
/// fields, one blank id.
pub const GROUPS_CSV: &str = "\u{feff}id,displayName,mail\r\n\
g-qs,KCQS.青山校區,kcqs@kcis.test\r\n\
g-qs-principal,KCQS10.青山校長室,principal@kcis.test\r\n\
g-qs-academic,KCQS1010.青山教務處,academic@kcis.test\r\n\
g-qs-teaching,KCQS101001.教學組,teaching@kcis.test\r\n\
g-qs-research,KCQS101002.課研組,\r\n\
g-hc-admin,\"KCHC20.新竹行政處, 總務\",admin@kcis.test\r\n\
,KCHC2001.orphan row,\r\n\
g-k1,K1.康軒集團,\r\n\
g-k1-hr,K101.人資處,hr@kcis.test\r\n\
g-notice,全校公告,notice@kcis.test\r\n";

/// Representative display names and whether they parse as `CODE<sep>label`.
pub const DISPLAY_NAMES: &[(&str, bool)] = &[
    ("KCQS1010.青山教務處", true),
    ("KCHC20-新竹行政處", true),
    ("NJ01_南京辦公室", true),
    ("KKC10 幼兒園教務", true),
    ("KCQS1010.  青山教務處  ", true),
    ("全校公告", false),
    ("kcqs1010.lowercase code", false),
    ("KCQS1010.", false),
    ("KCQS1010.   ", false),
    ("", false),
    (".no code", false),
];

/// The groups of [`GROUPS_CSV`] that carry an id, as records.
pub fn kcis_groups() -> Vec<GroupRecord> {
    vec![
        GroupRecord::new("g-qs", "KCQS.青山校區").with_mail("kcqs@kcis.test"),
        GroupRecord::new("g-qs-principal", "KCQS10.青山校長室").with_mail("principal@kcis.test"),
        GroupRecord::new("g-qs-academic", "KCQS1010.青山教務處").with_mail("academic@kcis.test"),
        GroupRecord::new("g-qs-teaching", "KCQS101001.教學組").with_mail("teaching@kcis.test"),
        GroupRecord::new("g-qs-research", "KCQS101002.課研組"),
        GroupRecord::new("g-hc-admin", "KCHC20.新竹行政處, 總務").with_mail("admin@kcis.test"),
        GroupRecord::new("g-k1", "K1.康軒集團"),
        GroupRecord::new("g-k1-hr", "K101.人資處").with_mail("hr@kcis.test"),
        GroupRecord::new("g-notice", "全校公告").with_mail("notice@kcis.test"),
    ]
}

pub fn teaching_members() -> Vec<Member> {
    vec![
        Member::new("u-keyu", "Keyu Chen", "keyu.chen@kcis.test").with_title("教學組長"),
        Member::new("u-amy", "Amy Lin", "amy.lin@kcis.test").with_title("English Teacher"),
        Member::new("u-mei", "王美玲", "mei.wang@kcis.test"),
    ]
}

pub fn academic_members() -> Vec<Member> {
    vec![
        Member::new("u-dean", "Dean Wu", "dean.wu@kcis.test").with_title("教務主任"),
        // Also in the teaching group; search lists both placements.
        Member::new("u-amy", "Amy Lin", "amy.lin@kcis.test").with_title("English Teacher"),
    ]
}

pub fn hr_members() -> Vec<Member> {
    vec![Member::new("u-grace", "Grace Huang", "grace.huang@kcis.test").with_title("HR Specialist")]
}
