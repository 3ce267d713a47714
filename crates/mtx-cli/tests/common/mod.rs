//! Sample messages and a translator over the bundled standards tree.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use mtx_cli::pipeline::Translator;
use mtx_standards::bundled_standards_root;
use mtx_validate::ValidatorConfig;

pub const MT101: &str = "{1:F01BANKDEFFAXXX0000000000}{2:I101BANKGB2LXXXXN}{4:
:20:BATCH-0001
:28D:1/1
:30:240115
:21:TX-0001
:32B:EUR1500,00
:59:/DE89370400440532013000
JOHN SMITH
:71A:SHA
-}";

pub const MT103: &str = "{1:F01BANKDEFFAXXX0000000000}{2:I103BANKGB2LXXXXN}{4:
:20:REF20240115001
:23B:CRED
:32A:240115EUR1250,50
:50K:/DE89370400440532013000
JOHN SMITH
1 MAIN STREET
:52A:BANKDEFFXXX
:57A:BANKGB2L
:59:/GB29NWBK60161331926819
JANE DOE
LONDON
:70:INVOICE 4711
:71A:SHA
-}";

pub const MT103_WITHOUT_CHARGES: &str = "{1:F01BANKDEFFAXXX0000000000}{2:I103BANKGB2LXXXXN}{4:
:20:REF20240115002
:23B:CRED
:32A:240115EUR99,00
:50K:JOHN SMITH
:59:/GB29NWBK60161331926819
JANE DOE
-}";

pub const MT202: &str = "{1:F01BANKDEFFAXXX0000000000}{2:I202BANKGB2LXXXXN}{4:
:20:FIT-0001
:21:REL-0001
:32A:240116USD500000,
:52A:BANKDEFFXXX
:57A:BANKGB2L
:58A:CHASUS33XXX
-}";

pub const MT202COV: &str = "{1:F01BANKDEFFAXXX0000000000}{2:I202BANKGB2LXXXXN}{3:{119:COV}}{4:
:20:COV-0001
:21:E2E-0001
:32A:240116EUR1000,00
:52A:BANKDEFFXXX
:58A:BANKGB2LXXX
:50K:/DE89370400440532013000
John Smith
:59:/GB29NWBK60161331926819
JANE DOE
:33B:EUR1000,00
-}";

pub const MT196_CANCELLATION: &str = "{1:F01BANKDEFFAXXX0000000000}{2:I196BANKGB2LXXXXN}{4:
:20:ANS-0001
:21:REF20240115001
:76:/RJCR/AC04
:79:ACCOUNT CLOSED
PLEASE CONTACT BENEFICIARY
-}";

pub const MT196_INFORMATION: &str = "{1:F01BANKDEFFAXXX0000000000}{2:I196BANKGB2LXXXXN}{4:
:20:ANS-0002
:21:REF20240115001
:76:/UNAB/
-}";

pub const MT940: &str = "{1:F01BANKDEFFAXXX0000000000}{2:I940BANKGB2LXXXXN}{4:
:20:STMT-0001
:25:DE89370400440532013000
:28C:1/1
:60F:C240115EUR1000,00
:61:2401150115C250,00NTRFNONREF
:62F:C240115EUR1250,00
-}";

pub fn translator() -> Translator {
    Translator::open(&bundled_standards_root(), ValidatorConfig::default())
        .expect("bundled standards open")
}

pub fn pinned_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}
